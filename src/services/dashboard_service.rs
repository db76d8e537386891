// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        dashboard::DashboardSummary,
        replenishment::UnfulfilledOrder,
        stock_limit::{evaluate, LowStockEntry},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary<'e, E>(&self, executor: E, warehouse_id: Option<Uuid>) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.repo.get_summary(executor, warehouse_id).await
    }

    pub async fn get_low_stock<'e, E>(&self, executor: E, warehouse_id: Option<Uuid>) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let levels = self.repo.get_limit_levels(executor, warehouse_id).await?;
        Ok(evaluate(levels))
    }

    pub async fn get_unfulfilled_orders<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<UnfulfilledOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_unfulfilled_orders(executor, warehouse_id).await
    }
}
