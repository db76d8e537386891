// src/db/stock_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        product_stock::{ProductStock, StockFlags, StockMovement, StockMovementKind, StockState},
        shrinkage::ShrinkageReason,
    },
};

// Filtros da listagem de unidades
#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub warehouse_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub state: Option<StockState>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Default)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Leitura
    // ---

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = sqlx::query_as::<_, ProductStock>("SELECT * FROM product_stock WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(unit)
    }

    pub async fn find_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, ProductStock>("SELECT * FROM product_stock WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(units)
    }

    // O CASE repete StockState::from_flags para filtrar pelo estado derivado
    pub async fn list<'e, E>(&self, executor: E, filter: &StockFilter) -> Result<Vec<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, ProductStock>(
            r#"
            SELECT * FROM product_stock
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::text IS NULL OR barcode = $2)
              AND ($3::text IS NULL OR (
                    CASE
                        WHEN is_deleted THEN 'deleted'
                        WHEN is_empty THEN 'empty'
                        WHEN is_kit AND is_being_used THEN 'in_kit'
                        WHEN is_being_used THEN 'in_use'
                        ELSE 'available'
                    END) = $3)
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.warehouse_id)
        .bind(filter.barcode.as_deref())
        .bind(filter.state.map(StockState::as_str))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(executor)
        .await?;
        Ok(units)
    }

    pub async fn history<'e, E>(&self, executor: E, id: Uuid) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE product_stock_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    // ---
    // Escrita
    // ---

    /// N unidades novas, disponíveis.
    pub async fn create_units<'e, E>(
        &self,
        executor: E,
        barcode: &str,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, ProductStock>(
            r#"
            INSERT INTO product_stock (barcode, warehouse_id)
            SELECT $1, $2 FROM generate_series(1, $3)
            RETURNING *
            "#,
        )
        .bind(barcode)
        .bind(warehouse_id)
        .bind(quantity)
        .fetch_all(executor)
        .await?;
        Ok(units)
    }

    /// Troca de estado otimista: o UPDATE só acontece se as flags ainda forem as lidas.
    pub async fn set_state<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from: StockFlags,
        to: StockState,
        deleted_reason: Option<ShrinkageReason>,
    ) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next = to.flags();
        sqlx::query_as::<_, ProductStock>(
            r#"
            UPDATE product_stock SET
                is_being_used = $6,
                is_empty = $7,
                is_deleted = $8,
                is_kit = $9,
                deleted_reason = COALESCE($10, deleted_reason),
                updated_at = NOW()
            WHERE id = $1
              AND is_being_used = $2 AND is_empty = $3 AND is_deleted = $4 AND is_kit = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from.is_being_used)
        .bind(from.is_empty)
        .bind(from.is_deleted)
        .bind(from.is_kit)
        .bind(next.is_being_used)
        .bind(next.is_empty)
        .bind(next.is_deleted)
        .bind(next.is_kit)
        .bind(deleted_reason)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::StockChangedConcurrently(id))
    }

    /// Saída para um empleado (retirada ou kit): estado + contadores de uso.
    pub async fn register_checkout<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from: StockFlags,
        to: StockState,
        employee_id: Uuid,
    ) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next = to.flags();
        sqlx::query_as::<_, ProductStock>(
            r#"
            UPDATE product_stock SET
                is_being_used = $6,
                is_kit = $7,
                number_of_uses = number_of_uses + 1,
                first_used_at = COALESCE(first_used_at, NOW()),
                last_used_at = NOW(),
                last_used_by = $8,
                updated_at = NOW()
            WHERE id = $1
              AND is_being_used = $2 AND is_empty = $3 AND is_deleted = $4 AND is_kit = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from.is_being_used)
        .bind(from.is_empty)
        .bind(from.is_deleted)
        .bind(from.is_kit)
        .bind(next.is_being_used)
        .bind(next.is_kit)
        .bind(employee_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::StockChangedConcurrently(id))
    }

    /// Uso no próprio almacén. `exhausted` marca a unidade como vazia.
    pub async fn record_usage<'e, E>(
        &self,
        executor: E,
        unit: &ProductStock,
        employee_id: Option<Uuid>,
        exhausted: bool,
    ) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProductStock>(
            r#"
            UPDATE product_stock SET
                number_of_uses = number_of_uses + 1,
                first_used_at = COALESCE(first_used_at, NOW()),
                last_used_at = NOW(),
                last_used_by = COALESCE($3, last_used_by),
                is_empty = $4,
                updated_at = NOW()
            WHERE id = $1 AND number_of_uses = $2
              AND NOT is_being_used AND NOT is_empty AND NOT is_deleted
            RETURNING *
            "#,
        )
        .bind(unit.id)
        .bind(unit.number_of_uses)
        .bind(employee_id)
        .bind(exhausted)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::StockChangedConcurrently(unit.id))
    }

    /// Recebimento de transferência: a unidade muda de almacén.
    pub async fn move_to_warehouse<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from_warehouse: Uuid,
        to_warehouse: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE product_stock SET warehouse_id = $3, updated_at = NOW()
            WHERE id = $1 AND warehouse_id = $2
              AND NOT is_being_used AND NOT is_empty AND NOT is_deleted
            "#,
        )
        .bind(id)
        .bind(from_warehouse)
        .bind(to_warehouse)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StockChangedConcurrently(id));
        }
        Ok(())
    }

    // ---
    // Histórico
    // ---

    /// Um movimento por unidade. O user_id vem do contexto da conexão.
    pub async fn insert_movements<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
        kind: StockMovementKind,
        warehouse_id: Uuid,
        employee_id: Option<Uuid>,
        reference_id: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO stock_movements (product_stock_id, kind, warehouse_id, employee_id, reference_id, notes)
            SELECT unit_id, $2, $3, $4, $5, $6 FROM unnest($1::uuid[]) AS unit_id
            "#,
        )
        .bind(ids)
        .bind(kind)
        .bind(warehouse_id)
        .bind(employee_id)
        .bind(reference_id)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
