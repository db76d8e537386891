// src/db/shrinkage_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::shrinkage::{NewShrinkageEvent, ShrinkageEvent, ShrinkageReason, ShrinkageReportRow},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShrinkageFilter {
    pub warehouse_id: Option<Uuid>,
    pub reason: Option<ShrinkageReason>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone, Default)]
pub struct ShrinkageRepository;

impl ShrinkageRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(&self, executor: E, event: &NewShrinkageEvent<'_>) -> Result<ShrinkageEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, ShrinkageEvent>(
            r#"
            INSERT INTO inventory_shrinkage_events (
                warehouse_id, barcode, product_stock_id, transfer_id,
                reason, quantity, unit_cost, notes, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(event.warehouse_id)
        .bind(event.barcode)
        .bind(event.product_stock_id)
        .bind(event.transfer_id)
        .bind(event.reason)
        .bind(event.quantity)
        .bind(event.unit_cost)
        .bind(event.notes)
        .bind(event.recorded_by)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: ShrinkageFilter) -> Result<Vec<ShrinkageEvent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let events = sqlx::query_as::<_, ShrinkageEvent>(
            r#"
            SELECT * FROM inventory_shrinkage_events
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::shrinkage_reason IS NULL OR reason = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.warehouse_id)
        .bind(filter.reason)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(executor)
        .await?;
        Ok(events)
    }

    /// Linhas do relatório. Sem almacén explícito, CEDIS fica de fora.
    pub async fn report_rows<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ShrinkageReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ShrinkageReportRow>(
            r#"
            SELECT e.warehouse_id, w.name AS warehouse_name, e.barcode, p.name AS product_name,
                   e.reason, e.quantity, e.unit_cost
            FROM inventory_shrinkage_events e
            JOIN warehouses w ON w.id = e.warehouse_id
            JOIN products p ON p.barcode = e.barcode
            WHERE (($1::uuid IS NULL AND NOT w.is_cedis) OR e.warehouse_id = $1)
              AND ($2::timestamptz IS NULL OR e.created_at >= $2)
              AND ($3::timestamptz IS NULL OR e.created_at < $3)
            "#,
        )
        .bind(warehouse_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn total_for_transfer<'e, E>(&self, executor: E, transfer_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::bigint FROM inventory_shrinkage_events WHERE transfer_id = $1",
        )
        .bind(transfer_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }
}
