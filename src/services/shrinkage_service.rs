// src/services/shrinkage_service.rs

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{shrinkage_repo::ShrinkageFilter, ProductRepository, ShrinkageRepository},
    middleware::scope::WarehouseScope,
    models::shrinkage::{summarize, NewShrinkageEvent, ShrinkageEvent, ShrinkageReason, ShrinkageSummary},
};

#[derive(Clone)]
pub struct ShrinkageService {
    shrinkage_repo: ShrinkageRepository,
    product_repo: ProductRepository,
}

impl ShrinkageService {
    pub fn new(shrinkage_repo: ShrinkageRepository, product_repo: ProductRepository) -> Self {
        Self { shrinkage_repo, product_repo }
    }

    /// Baixa em lote (sem unidade específica), ex.: consumo de granel.
    pub async fn record_event<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        warehouse_id: Uuid,
        barcode: &str,
        quantity: i32,
        reason: ShrinkageReason,
        notes: Option<&str>,
    ) -> Result<ShrinkageEvent, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        if !reason.is_manual() {
            return Err(AppError::ReservedShrinkageReason);
        }
        scope.ensure_allows(warehouse_id)?;

        let mut conn = executor.acquire().await?;

        let product = self
            .product_repo
            .find_by_barcode(&mut *conn, barcode)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", barcode)))?;

        let event = self
            .shrinkage_repo
            .insert(
                &mut *conn,
                &NewShrinkageEvent {
                    warehouse_id,
                    barcode: &product.barcode,
                    product_stock_id: None,
                    transfer_id: None,
                    reason,
                    quantity,
                    unit_cost: product.unit_cost,
                    notes,
                    recorded_by: Some(user_id),
                },
            )
            .await?;

        tracing::info!("📉 Merma registrada: {} x {} ({})", quantity, barcode, reason.as_str());
        Ok(event)
    }

    pub async fn list_events<'e, E>(&self, executor: E, filter: ShrinkageFilter) -> Result<Vec<ShrinkageEvent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.shrinkage_repo.list(executor, filter).await
    }

    /// Relatório agregado. `warehouse_id = None` cobre tudo menos o CEDIS.
    pub async fn summary<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<ShrinkageSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = self.shrinkage_repo.report_rows(executor, warehouse_id, from, to).await?;
        Ok(summarize(&rows))
    }
}
