// src/models/withdraw_order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::assignment::ReturnableDetail;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawOrder {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub warehouse_id: Uuid,
    pub num_items: i32,
    pub created_by: Option<Uuid>,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawOrderDetail {
    pub id: Uuid,
    pub withdraw_order_id: Uuid,
    pub product_stock_id: Uuid,
    pub barcode: String,
    pub withdrawn_at: DateTime<Utc>,
    pub is_returned: bool,
    pub returned_at: Option<DateTime<Utc>>,
}

impl ReturnableDetail for WithdrawOrderDetail {
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
pub struct WithdrawOrderWithDetails {
    #[serde(flatten)]
    pub order: WithdrawOrder,
    pub details: Vec<WithdrawOrderDetail>,
}
