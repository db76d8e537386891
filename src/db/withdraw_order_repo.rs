// src/db/withdraw_order_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::kit_repo::AssignmentFilter,
    models::withdraw_order::{WithdrawOrder, WithdrawOrderDetail},
};

#[derive(Clone, Default)]
pub struct WithdrawOrderRepository;

impl WithdrawOrderRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        warehouse_id: Uuid,
        created_by: Uuid,
    ) -> Result<WithdrawOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, WithdrawOrder>(
            r#"
            INSERT INTO withdraw_orders (employee_id, warehouse_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(employee_id)
        .bind(warehouse_id)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn insert_details<'e, E>(&self, executor: E, order_id: Uuid, stock_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO withdraw_order_details (withdraw_order_id, product_stock_id)
            SELECT $1, unit_id FROM unnest($2::uuid[]) AS unit_id
            "#,
        )
        .bind(order_id)
        .bind(stock_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// num_items sempre reflete a quantidade de detalhes.
    pub async fn refresh_num_items<'e, E>(&self, executor: E, order_id: Uuid) -> Result<WithdrawOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, WithdrawOrder>(
            r#"
            UPDATE withdraw_orders SET num_items = (
                SELECT COUNT(*)::int FROM withdraw_order_details WHERE withdraw_order_id = $1
            )
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WithdrawOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, WithdrawOrder>("SELECT * FROM withdraw_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn details<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<WithdrawOrderDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, WithdrawOrderDetail>(
            r#"
            SELECT d.id, d.withdraw_order_id, d.product_stock_id, s.barcode,
                   d.withdrawn_at, d.is_returned, d.returned_at
            FROM withdraw_order_details d
            JOIN product_stock s ON s.id = d.product_stock_id
            WHERE d.withdraw_order_id = $1
            ORDER BY d.withdrawn_at, s.barcode
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: AssignmentFilter) -> Result<Vec<WithdrawOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, WithdrawOrder>(
            r#"
            SELECT * FROM withdraw_orders
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
        Ok(orders)
    }

    /// Trava o cabeçalho enquanto estiver aberto. `None` = já completo (ou inexistente).
    /// Devoluções concorrentes da mesma ordem esperam aqui até o commit da anterior.
    pub async fn lock_open<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WithdrawOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, WithdrawOrder>(
            "UPDATE withdraw_orders SET is_complete = is_complete WHERE id = $1 AND NOT is_complete RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn mark_returned<'e, E>(&self, executor: E, detail_ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE withdraw_order_details SET is_returned = true, returned_at = NOW()
            WHERE id = ANY($1) AND NOT is_returned
            "#,
        )
        .bind(detail_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn complete<'e, E>(&self, executor: E, order_id: Uuid) -> Result<WithdrawOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, WithdrawOrder>(
            "UPDATE withdraw_orders SET is_complete = true, completed_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }
}
