// src/services/warehouse_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::WarehouseRepository,
    models::warehouse::{Cabinet, CabinetView, Warehouse},
};

#[derive(Clone)]
pub struct WarehouseService {
    warehouse_repo: WarehouseRepository,
}

impl WarehouseService {
    pub fn new(warehouse_repo: WarehouseRepository) -> Self {
        Self { warehouse_repo }
    }

    /// Cria o almacén e, se não for CEDIS, o gabinete junto (mesma transação).
    pub async fn create_warehouse<'e, E>(
        &self,
        executor: E,
        name: &str,
        code: &str,
        is_cedis: bool,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let warehouse = self.warehouse_repo.create(&mut *tx, name, code, is_cedis).await?;

        if !warehouse.is_cedis {
            self.warehouse_repo
                .create_cabinet(&mut *tx, warehouse.id, &warehouse.cabinet_name())
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "🏬 Almacén criado: {} ({}){}",
            warehouse.name,
            warehouse.code,
            if warehouse.is_cedis { " [CEDIS]" } else { "" }
        );
        Ok(warehouse)
    }

    pub async fn get_warehouse<'e, E>(&self, executor: E, id: Uuid) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo
            .find_by_id(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", id)))
    }

    pub async fn list_warehouses<'e, E>(&self, executor: E) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo.list(executor).await
    }

    pub async fn update_warehouse<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = self
            .warehouse_repo
            .update(executor, id, name, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", id)))?;

        if is_active == Some(false) {
            tracing::info!("⏸️ Almacén desativado: {}", warehouse.code);
        }
        Ok(warehouse)
    }

    // --- Gabinetes ---

    /// Recria o gabinete de um almacén que ficou sem (CEDIS nunca tem).
    pub async fn create_cabinet<'e, E>(&self, executor: E, warehouse_id: Uuid) -> Result<Cabinet, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let warehouse = self
            .warehouse_repo
            .find_by_id(&mut *tx, warehouse_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", warehouse_id)))?;

        if warehouse.is_cedis {
            return Err(AppError::CedisHasNoCabinet(warehouse.id));
        }

        let cabinet = self
            .warehouse_repo
            .create_cabinet(&mut *tx, warehouse.id, &warehouse.cabinet_name())
            .await?;

        tx.commit().await?;
        Ok(cabinet)
    }

    pub async fn list_cabinets<'e, E>(&self, executor: E) -> Result<Vec<CabinetView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo.list_cabinets(executor).await
    }
}
