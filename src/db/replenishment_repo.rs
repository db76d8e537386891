// src/db/replenishment_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::replenishment::{ReplenishmentDetail, ReplenishmentOrder, ReplenishmentStatus},
};

#[derive(Clone, Default)]
pub struct ReplenishmentRepository;

impl ReplenishmentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        cedis_warehouse_id: Uuid,
        notes: Option<&str>,
        requested_by: Uuid,
    ) -> Result<ReplenishmentOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ReplenishmentOrder>(
            r#"
            INSERT INTO replenishment_orders (warehouse_id, cedis_warehouse_id, notes, requested_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(warehouse_id)
        .bind(cedis_warehouse_id)
        .bind(notes)
        .bind(requested_by)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn insert_details<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        barcodes: &[String],
        quantities: &[i32],
    ) -> Result<Vec<ReplenishmentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, ReplenishmentDetail>(
            r#"
            INSERT INTO replenishment_order_details (order_id, barcode, quantity)
            SELECT $1, item.barcode, item.quantity
            FROM unnest($2::text[], $3::int[]) AS item(barcode, quantity)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(barcodes)
        .bind(quantities)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ReplenishmentOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ReplenishmentOrder>("SELECT * FROM replenishment_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn find_by_transfer<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
    ) -> Result<Option<ReplenishmentOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ReplenishmentOrder>(
            "SELECT * FROM replenishment_orders WHERE transfer_id = $1",
        )
        .bind(transfer_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn details<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<ReplenishmentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, ReplenishmentDetail>(
            "SELECT * FROM replenishment_order_details WHERE order_id = $1 ORDER BY barcode",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        status: Option<ReplenishmentStatus>,
    ) -> Result<Vec<ReplenishmentOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, ReplenishmentOrder>(
            r#"
            SELECT * FROM replenishment_orders
            WHERE ($1::uuid IS NULL OR warehouse_id = $1 OR cedis_warehouse_id = $1)
              AND ($2::replenishment_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(warehouse_id)
        .bind(status)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    /// Troca de status otimista. Também vincula a transferência e carimba as datas.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from: ReplenishmentStatus,
        to: ReplenishmentStatus,
        transfer_id: Option<Uuid>,
    ) -> Result<ReplenishmentOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ReplenishmentOrder>(
            r#"
            UPDATE replenishment_orders SET
                status = $3,
                transfer_id = COALESCE($4, transfer_id),
                sent_at = CASE WHEN $3 = 'SENT'::replenishment_status THEN NOW() ELSE sent_at END,
                completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(transfer_id)
        .bind(to.stamps_completion())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition {
            entity: "replenishment_order",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }

    pub async fn set_sent_quantities<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        barcodes: &[String],
        quantities: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE replenishment_order_details d SET sent_quantity = item.quantity
            FROM unnest($2::text[], $3::int[]) AS item(barcode, quantity)
            WHERE d.order_id = $1 AND d.barcode = item.barcode
            "#,
        )
        .bind(order_id)
        .bind(barcodes)
        .bind(quantities)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Barcodes ausentes da lista ficam com 0 recebidos.
    pub async fn set_received_quantities<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        barcodes: &[String],
        quantities: &[i32],
    ) -> Result<Vec<ReplenishmentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, ReplenishmentDetail>(
            r#"
            UPDATE replenishment_order_details d SET received_quantity = COALESCE(
                (SELECT item.quantity
                 FROM unnest($2::text[], $3::int[]) AS item(barcode, quantity)
                 WHERE item.barcode = d.barcode),
                0)
            WHERE d.order_id = $1
            RETURNING d.*
            "#,
        )
        .bind(order_id)
        .bind(barcodes)
        .bind(quantities)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }
}
