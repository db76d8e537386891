// src/db/warehouse_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::warehouse::{Cabinet, CabinetView, Warehouse},
};

#[derive(Clone, Default)]
pub struct WarehouseRepository;

impl WarehouseRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        code: &str,
        is_cedis: bool,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (name, code, is_cedis)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(is_cedis)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("warehouses_code_key") => {
                AppError::WarehouseCodeAlreadyExists(code.to_string())
            }
            _ => e.into(),
        })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(warehouse)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT * FROM warehouses ORDER BY is_cedis DESC, name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(warehouses)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            UPDATE warehouses SET
                name = COALESCE($2, name),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(warehouse)
    }

    // --- Gabinetes ---

    pub async fn create_cabinet<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        name: &str,
    ) -> Result<Cabinet, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cabinet>(
            r#"
            INSERT INTO cabinet_warehouses (warehouse_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(warehouse_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("cabinet_warehouses_warehouse_id_key") =>
            {
                AppError::CabinetAlreadyExists(warehouse_id)
            }
            _ => e.into(),
        })
    }

    pub async fn list_cabinets<'e, E>(&self, executor: E) -> Result<Vec<CabinetView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cabinets = sqlx::query_as::<_, CabinetView>(
            r#"
            SELECT c.id, c.warehouse_id, w.name AS warehouse_name, c.name, c.created_at
            FROM cabinet_warehouses c
            JOIN warehouses w ON w.id = c.warehouse_id
            ORDER BY w.name ASC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(cabinets)
    }
}
