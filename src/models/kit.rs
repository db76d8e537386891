// src/models/kit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::assignment::ReturnableDetail;

// Kit = pacote de unidades entregue a um empleado, devolvido unidade a unidade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kit {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub warehouse_id: Uuid,
    pub observations: Option<String>,
    pub created_by: Option<Uuid>,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Detalhe já com o barcode da unidade (JOIN em product_stock)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KitDetail {
    pub id: Uuid,
    pub kit_id: Uuid,
    pub product_stock_id: Uuid,
    pub barcode: String,
    pub is_returned: bool,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReturnableDetail for KitDetail {
    fn detail_id(&self) -> Uuid {
        self.id
    }

    fn product_stock_id(&self) -> Uuid {
        self.product_stock_id
    }

    fn is_returned(&self) -> bool {
        self.is_returned
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KitWithDetails {
    #[serde(flatten)]
    pub kit: Kit,
    pub details: Vec<KitDetail>,
}
