// src/models/employee.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,

    #[schema(example = "Mariana")]
    pub name: String,

    #[schema(example = "Ortiz")]
    pub surname: String,

    pub email: Option<String>,
    pub warehouse_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Um empleado só retira unidades do próprio almacén e enquanto estiver ativo.
    pub fn ensure_can_check_out(&self, warehouse_id: Uuid) -> Result<(), AppError> {
        if !self.is_active {
            return Err(AppError::EmployeeInactive(self.id));
        }
        if self.warehouse_id != warehouse_id {
            return Err(AppError::EmployeeWarehouseMismatch(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(active: bool, warehouse_id: Uuid) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Mariana".into(),
            surname: "Ortiz".into(),
            email: None,
            warehouse_id,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_employee_checks_out_in_own_warehouse() {
        let wh = Uuid::new_v4();
        assert!(employee(true, wh).ensure_can_check_out(wh).is_ok());
    }

    #[test]
    fn inactive_employee_is_rejected() {
        let wh = Uuid::new_v4();
        let err = employee(false, wh).ensure_can_check_out(wh).unwrap_err();
        assert!(matches!(err, AppError::EmployeeInactive(_)));
    }

    #[test]
    fn other_warehouse_is_rejected() {
        let err = employee(true, Uuid::new_v4())
            .ensure_can_check_out(Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, AppError::EmployeeWarehouseMismatch(_)));
    }
}
