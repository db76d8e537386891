// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Contagem de unidades por estado
#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockCounts {
    pub available: i64,
    pub in_use: i64,
    pub in_kit: i64,
    pub empty: i64,
    pub deleted: i64,
}

// 2. Resumo (os cards do topo)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stock: StockCounts,
    pub open_kits: i64,
    pub open_withdraw_orders: i64,
    pub open_transfers: i64,
    pub unfulfilled_replenishment_orders: i64,
    pub shrinkage_quantity_this_month: i64,
    #[schema(value_type = f64)]
    pub shrinkage_cost_this_month: Decimal,
}
