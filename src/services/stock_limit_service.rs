// src/services/stock_limit_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::StockLimitRepository,
    models::stock_limit::{ensure_range, LimitType, StockLimit},
};

#[derive(Clone)]
pub struct StockLimitService {
    stock_limit_repo: StockLimitRepository,
}

// Campos opcionais do PUT aplicados sobre o limite atual
fn merge(
    current: &StockLimit,
    limit_type: Option<LimitType>,
    min_value: Option<i32>,
    max_value: Option<i32>,
) -> Result<(LimitType, i32, i32), AppError> {
    let limit_type = limit_type.unwrap_or(current.limit_type);
    let min_value = min_value.unwrap_or(current.min_value);
    let max_value = max_value.unwrap_or(current.max_value);
    ensure_range(min_value, max_value)?;
    Ok((limit_type, min_value, max_value))
}

impl StockLimitService {
    pub fn new(stock_limit_repo: StockLimitRepository) -> Self {
        Self { stock_limit_repo }
    }

    pub async fn create_limit<'e, E>(
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
        ensure_range(min_value, max_value)?;
        self.stock_limit_repo
            .create(executor, warehouse_id, barcode, limit_type, min_value, max_value)
            .await
    }

    pub async fn get_limit<'e, E>(&self, executor: E, id: Uuid) -> Result<StockLimit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.stock_limit_repo
            .find_by_id(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("stock_limit {}", id)))
    }

    pub async fn list_limits<'e, E>(&self, executor: E, warehouse_id: Option<Uuid>) -> Result<Vec<StockLimit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.stock_limit_repo.list(executor, warehouse_id).await
    }

    /// `current` já foi lido pelo handler (que checou o escopo do almacén).
    pub async fn update_limit<'e, E>(
        &self,
        executor: E,
        current: &StockLimit,
        limit_type: Option<LimitType>,
        min_value: Option<i32>,
        max_value: Option<i32>,
    ) -> Result<StockLimit, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let (limit_type, min_value, max_value) = merge(current, limit_type, min_value, max_value)?;

        let mut tx = executor.begin().await?;
        let updated = self
            .stock_limit_repo
            .update(&mut *tx, current.id, limit_type, min_value, max_value)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("stock_limit {}", current.id)))?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete_limit<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.stock_limit_repo.delete(executor, id).await? {
            return Err(AppError::ResourceNotFound(format!("stock_limit {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn limit(min: i32, max: i32) -> StockLimit {
        StockLimit {
            id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            barcode: "750".into(),
            limit_type: LimitType::Quantity,
            min_value: min,
            max_value: max,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let current = limit(2, 10);
        assert_eq!(merge(&current, None, None, None).unwrap(), (LimitType::Quantity, 2, 10));
        assert_eq!(
            merge(&current, Some(LimitType::Usage), None, Some(20)).unwrap(),
            (LimitType::Usage, 2, 20)
        );
    }

    #[test]
    fn merged_range_is_checked() {
        // só o mínimo mudou, mas passa do máximo atual
        let current = limit(2, 10);
        assert!(matches!(
            merge(&current, None, Some(11), None),
            Err(AppError::InvalidLimitRange { min: 11, max: 10 })
        ));
    }
}
