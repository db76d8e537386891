// src/db/stock_limit_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stock_limit::{LimitType, StockLimit},
};

#[derive(Clone, Default)]
pub struct StockLimitRepository;

impl StockLimitRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        barcode: &str,
        limit_type: LimitType,
        min_value: i32,
        max_value: i32,
    ) -> Result<StockLimit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockLimit>(
            r#"
            INSERT INTO stock_limits (warehouse_id, barcode, limit_type, min_value, max_value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(warehouse_id)
        .bind(barcode)
        .bind(limit_type)
        .bind(min_value)
        .bind(max_value)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("stock_limits_warehouse_barcode_key") =>
            {
                AppError::StockLimitAlreadyExists(barcode.to_string())
            }
            _ => e.into(),
        })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<StockLimit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let limit = sqlx::query_as::<_, StockLimit>("SELECT * FROM stock_limits WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(limit)
    }

    pub async fn list<'e, E>(&self, executor: E, warehouse_id: Option<Uuid>) -> Result<Vec<StockLimit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let limits = sqlx::query_as::<_, StockLimit>(
            r#"
            SELECT * FROM stock_limits
            WHERE $1::uuid IS NULL OR warehouse_id = $1
            ORDER BY warehouse_id, barcode
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;
        Ok(limits)
    }

    // Recebe os valores já mesclados pelo serviço
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        limit_type: LimitType,
        min_value: i32,
        max_value: i32,
    ) -> Result<Option<StockLimit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let limit = sqlx::query_as::<_, StockLimit>(
            r#"
            UPDATE stock_limits SET
                limit_type = $2,
                min_value = $3,
                max_value = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(limit_type)
        .bind(min_value)
        .bind(max_value)
        .fetch_optional(executor)
        .await?;
        Ok(limit)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM stock_limits WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
