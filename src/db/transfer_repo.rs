// src/db/transfer_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::transfer::{TransferDetail, TransferStatus, WarehouseTransfer},
};

#[derive(Clone, Default)]
pub struct TransferRepository;

impl TransferRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, WarehouseTransfer>(
            r#"
            INSERT INTO warehouse_transfers (source_warehouse_id, destination_warehouse_id, notes, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(source_warehouse_id)
        .bind(destination_warehouse_id)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("warehouse_transfers_distinct") => {
                AppError::SameWarehouseTransfer
            }
            _ => e.into(),
        })
    }

    // O barcode fica congelado no detalhe (base da conciliação)
    pub async fn insert_details<'e, E>(&self, executor: E, transfer_id: Uuid, stock_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO warehouse_transfer_details (transfer_id, product_stock_id, barcode)
            SELECT $1, s.id, s.barcode FROM product_stock s WHERE s.id = ANY($2)
            "#,
        )
        .bind(transfer_id)
        .bind(stock_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, WarehouseTransfer>("SELECT * FROM warehouse_transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(transfer)
    }

    pub async fn details<'e, E>(&self, executor: E, transfer_id: Uuid) -> Result<Vec<TransferDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, TransferDetail>(
            "SELECT * FROM warehouse_transfer_details WHERE transfer_id = $1 ORDER BY barcode, id",
        )
        .bind(transfer_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    // Origem ou destino
    pub async fn list<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        status: Option<TransferStatus>,
    ) -> Result<Vec<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfers = sqlx::query_as::<_, WarehouseTransfer>(
            r#"
            SELECT * FROM warehouse_transfers
            WHERE ($1::uuid IS NULL OR source_warehouse_id = $1 OR destination_warehouse_id = $1)
              AND ($2::transfer_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(warehouse_id)
        .bind(status)
        .fetch_all(executor)
        .await?;
        Ok(transfers)
    }

    /// Troca de status otimista (só se ainda estiver em `from`).
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from: TransferStatus,
        to: TransferStatus,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, WarehouseTransfer>(
            r#"
            UPDATE warehouse_transfers SET
                status = $3,
                shipped_at = CASE WHEN $3 = 'IN_TRANSIT'::transfer_status THEN NOW() ELSE shipped_at END,
                completed_at = CASE WHEN $3 = 'COMPLETED'::transfer_status THEN NOW() ELSE completed_at END
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::InvalidStatusTransition {
            entity: "transfer",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }

    pub async fn mark_received<'e, E>(&self, executor: E, transfer_id: Uuid, stock_ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE warehouse_transfer_details SET is_received = true, received_at = NOW()
            WHERE transfer_id = $1 AND product_stock_id = ANY($2) AND NOT is_received
            "#,
        )
        .bind(transfer_id)
        .bind(stock_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unidades da lista que já estão numa transferência PENDING ou IN_TRANSIT.
    pub async fn units_in_open_transfers<'e, E>(&self, executor: E, stock_ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT d.product_stock_id
            FROM warehouse_transfer_details d
            JOIN warehouse_transfers t ON t.id = d.transfer_id
            WHERE t.status IN ('PENDING', 'IN_TRANSIT')
              AND d.product_stock_id = ANY($1)
            "#,
        )
        .bind(stock_ids)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }
}
