// src/db/kit_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::kit::{Kit, KitDetail},
};

// Filtros de listagem compartilhados por kits e ordens de retirada
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentFilter {
    pub warehouse_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub open: Option<bool>,
}

#[derive(Clone, Default)]
pub struct KitRepository;

impl KitRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        warehouse_id: Uuid,
        observations: Option<&str>,
        created_by: Uuid,
    ) -> Result<Kit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = sqlx::query_as::<_, Kit>(
            r#"
            INSERT INTO kits (employee_id, warehouse_id, observations, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(employee_id)
        .bind(warehouse_id)
        .bind(observations)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(kit)
    }

    pub async fn insert_details<'e, E>(&self, executor: E, kit_id: Uuid, stock_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO kit_details (kit_id, product_stock_id)
            SELECT $1, unit_id FROM unnest($2::uuid[]) AS unit_id
            "#,
        )
        .bind(kit_id)
        .bind(stock_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Kit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = sqlx::query_as::<_, Kit>("SELECT * FROM kits WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(kit)
    }

    pub async fn details<'e, E>(&self, executor: E, kit_id: Uuid) -> Result<Vec<KitDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, KitDetail>(
            r#"
            SELECT d.id, d.kit_id, d.product_stock_id, s.barcode, d.is_returned, d.returned_at, d.created_at
            FROM kit_details d
            JOIN product_stock s ON s.id = d.product_stock_id
            WHERE d.kit_id = $1
            ORDER BY s.barcode, d.created_at
            "#,
        )
        .bind(kit_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: AssignmentFilter) -> Result<Vec<Kit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kits = sqlx::query_as::<_, Kit>(
            r#"
            SELECT * FROM kits
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR employee_id = $2)
              AND ($3::boolean IS NULL OR is_complete <> $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.warehouse_id)
        .bind(filter.employee_id)
        .bind(filter.open)
        .fetch_all(executor)
        .await?;
        Ok(kits)
    }

    /// Trava o cabeçalho enquanto estiver aberto. `None` = já completo (ou inexistente).
    /// Devoluções concorrentes do mesmo kit esperam aqui até o commit da anterior.
    pub async fn lock_open<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Kit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = sqlx::query_as::<_, Kit>(
            "UPDATE kits SET is_complete = is_complete WHERE id = $1 AND NOT is_complete RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(kit)
    }

    pub async fn mark_returned<'e, E>(&self, executor: E, detail_ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE kit_details SET is_returned = true, returned_at = NOW()
            WHERE id = ANY($1) AND NOT is_returned
            "#,
        )
        .bind(detail_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn complete<'e, E>(&self, executor: E, kit_id: Uuid) -> Result<Kit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = sqlx::query_as::<_, Kit>(
            "UPDATE kits SET is_complete = true, completed_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(kit_id)
        .fetch_one(executor)
        .await?;
        Ok(kit)
    }
}
