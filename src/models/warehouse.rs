// src/models/warehouse.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// --- Almacén ---
// Um CEDIS é o centro de distribuição: não tem gabinete e delimita o escopo global.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,

    #[schema(example = "Sucursal Centro")]
    pub name: String,

    #[schema(example = "SUC-CEN")]
    pub code: String,

    pub is_cedis: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn cabinet_name(&self) -> String {
        format!("{} cabinet", self.code)
    }
}

// --- Gabinete (um por almacén, exceto CEDIS) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cabinet {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CabinetView {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
