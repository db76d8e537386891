// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// Catálogo: o código de barras identifica o produto, cada unidade física vive em product_stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(example = "7501031311309")]
    pub barcode: String,

    #[schema(example = "Shampoo profesional 1L")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = "Cabello")]
    pub category: Option<String>,

    #[schema(value_type = f64, example = 85.5)]
    pub unit_cost: Decimal,

    // Quantos usos uma unidade aguenta antes de ficar vazia
    #[schema(example = 20)]
    pub max_uses: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
