// src/services/employee_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, WarehouseRepository},
    models::employee::Employee,
};

#[derive(Clone)]
pub struct EmployeeService {
    employee_repo: EmployeeRepository,
    warehouse_repo: WarehouseRepository,
}

impl EmployeeService {
    pub fn new(employee_repo: EmployeeRepository, warehouse_repo: WarehouseRepository) -> Self {
        Self { employee_repo, warehouse_repo }
    }

    async fn ensure_warehouse_exists<'e, E>(&self, executor: E, warehouse_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo
            .find_by_id(executor, warehouse_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", warehouse_id)))
    }

    pub async fn create_employee<'e, E>(
        &self,
        executor: E,
        name: &str,
        surname: &str,
        email: Option<&str>,
        warehouse_id: Uuid,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.ensure_warehouse_exists(&mut *tx, warehouse_id).await?;
        let employee = self
            .employee_repo
            .create(&mut *tx, name, surname, email, warehouse_id)
            .await?;

        tx.commit().await?;
        Ok(employee)
    }

    pub async fn get_employee<'e, E>(&self, executor: E, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.employee_repo
            .find_by_id(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", id)))
    }

    pub async fn list_employees<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.employee_repo.list(executor, warehouse_id, include_inactive).await
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        surname: Option<&str>,
        email: Option<&str>,
        warehouse_id: Option<Uuid>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if let Some(warehouse_id) = warehouse_id {
            self.ensure_warehouse_exists(&mut *tx, warehouse_id).await?;
        }

        let employee = self
            .employee_repo
            .update(&mut *tx, id, name, surname, email, warehouse_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", id)))?;

        tx.commit().await?;
        Ok(employee)
    }

    /// Baixa lógica. Bloqueada enquanto houver kit ou retirada em aberto.
    pub async fn deactivate_employee<'e, E>(&self, executor: E, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let open = self.employee_repo.count_open_assignments(&mut *tx, id).await?;
        if open > 0 {
            return Err(AppError::EmployeeHasOpenAssignments(id));
        }

        let employee = self
            .employee_repo
            .deactivate(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", id)))?;

        tx.commit().await?;
        tracing::info!("👋 Empleado desativado: {} {}", employee.name, employee.surname);
        Ok(employee)
    }
}
