// src/services/stock_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        stock_repo::StockFilter, ProductRepository, ShrinkageRepository, StockRepository,
        TransferRepository, WarehouseRepository,
    },
    middleware::scope::WarehouseScope,
    models::{
        product_stock::{
            ensure_batch_ready, usage_exhausted, ProductStock, StockAction, StockMovement,
            StockMovementKind,
        },
        shrinkage::{NewShrinkageEvent, ShrinkageReason},
    },
};

// ---
// Helpers compartilhados com kits, retiradas e transferências
// ---

/// Recusa unidades que já fazem parte de uma transferência aberta.
pub(crate) async fn ensure_not_in_open_transfer(
    transfer_repo: &TransferRepository,
    conn: &mut PgConnection,
    ids: &[Uuid],
    action: StockAction,
) -> Result<(), AppError> {
    if !action.blocked_by_open_transfer() {
        return Ok(());
    }
    let blocked = transfer_repo.units_in_open_transfers(&mut *conn, ids).await?;
    match blocked.first() {
        Some(id) => Err(AppError::UnitInOpenTransfer(*id)),
        None => Ok(()),
    }
}

/// Entrega um lote a um empleado (retirada ou kit). Devolve as unidades atualizadas.
pub(crate) async fn check_out_units(
    stock_repo: &StockRepository,
    transfer_repo: &TransferRepository,
    conn: &mut PgConnection,
    ids: &[Uuid],
    warehouse_id: Uuid,
    employee_id: Uuid,
    action: StockAction,
) -> Result<Vec<ProductStock>, AppError> {
    // 1. Lote inteiro validado antes de qualquer UPDATE
    let units = stock_repo.find_many(&mut *conn, ids).await?;
    ensure_batch_ready(&units, ids, warehouse_id, action)?;
    ensure_not_in_open_transfer(transfer_repo, conn, ids, action).await?;

    // 2. Estado + contadores, unidade a unidade (UPDATE otimista)
    let mut updated = Vec::with_capacity(units.len());
    for unit in &units {
        let to = unit.transition(action)?;
        let unit = stock_repo
            .register_checkout(&mut *conn, unit.id, unit.flags(), to, employee_id)
            .await?;
        updated.push(unit);
    }
    Ok(updated)
}

/// Devolve unidades de um kit/retirada (Available ou Empty).
pub(crate) async fn return_units(
    stock_repo: &StockRepository,
    conn: &mut PgConnection,
    ids: &[Uuid],
    mark_empty: bool,
) -> Result<(), AppError> {
    let units = stock_repo.find_many(&mut *conn, ids).await?;
    for id in ids {
        let unit = units
            .iter()
            .find(|u| u.id == *id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("product_stock {}", id)))?;
        let to = unit.transition(StockAction::Return { mark_empty })?;
        stock_repo.set_state(&mut *conn, unit.id, unit.flags(), to, None).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct StockService {
    stock_repo: StockRepository,
    product_repo: ProductRepository,
    warehouse_repo: WarehouseRepository,
    transfer_repo: TransferRepository,
    shrinkage_repo: ShrinkageRepository,
}

impl StockService {
    pub fn new(
        stock_repo: StockRepository,
        product_repo: ProductRepository,
        warehouse_repo: WarehouseRepository,
        transfer_repo: TransferRepository,
        shrinkage_repo: ShrinkageRepository,
    ) -> Self {
        Self { stock_repo, product_repo, warehouse_repo, transfer_repo, shrinkage_repo }
    }

    async fn load_unit(
        &self,
        conn: &mut PgConnection,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<ProductStock, AppError> {
        let unit = self
            .stock_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product_stock {}", id)))?;
        scope.ensure_allows(unit.warehouse_id)?;
        Ok(unit)
    }

    // --- ENTRADA ---
    pub async fn create_units<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        barcode: &str,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        scope.ensure_allows(warehouse_id)?;
        let mut tx = executor.begin().await?;

        // 1. Produto e almacén
        self.product_repo
            .find_by_barcode(&mut *tx, barcode)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", barcode)))?;

        let warehouse = self
            .warehouse_repo
            .find_by_id(&mut *tx, warehouse_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", warehouse_id)))?;
        if !warehouse.is_active {
            return Err(AppError::WarehouseInactive(warehouse.id));
        }

        // 2. Unidades + histórico
        let units = self
            .stock_repo
            .create_units(&mut *tx, barcode, warehouse_id, quantity)
            .await?;
        let ids: Vec<Uuid> = units.iter().map(|u| u.id).collect();
        self.stock_repo
            .insert_movements(&mut *tx, &ids, StockMovementKind::Created, warehouse_id, None, None, None)
            .await?;

        tx.commit().await?;

        tracing::info!("📥 {} unidades de {} criadas em {}", units.len(), barcode, warehouse.code);
        Ok(units)
    }

    // --- LEITURA ---
    pub async fn list_units<'e, E>(&self, executor: E, filter: &StockFilter) -> Result<Vec<ProductStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.stock_repo.list(executor, filter).await
    }

    pub async fn get_unit<'e, E>(&self, executor: E, scope: WarehouseScope, id: Uuid) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        self.load_unit(&mut *conn, scope, id).await
    }

    pub async fn get_history<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        self.load_unit(&mut *conn, scope, id).await?;
        self.stock_repo.history(&mut *conn, id).await
    }

    // --- TRANSIÇÕES ---
    pub async fn mark_empty<'e, E>(&self, executor: E, scope: WarehouseScope, id: Uuid) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let unit = self.load_unit(&mut *tx, scope, id).await?;
        let to = unit.transition(StockAction::MarkEmpty)?;
        ensure_not_in_open_transfer(&self.transfer_repo, &mut *tx, &[id], StockAction::MarkEmpty).await?;
        let updated = self.stock_repo.set_state(&mut *tx, id, unit.flags(), to, None).await?;
        self.stock_repo
            .insert_movements(&mut *tx, &[id], StockMovementKind::MarkedEmpty, unit.warehouse_id, None, None, None)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Uso no próprio almacén. Ao atingir `max_uses` a unidade esvazia sozinha.
    pub async fn record_usage<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Unidade disponível e fora de transferências abertas
        let unit = self.load_unit(&mut *tx, scope, id).await?;
        unit.transition(StockAction::RecordUsage)?;
        ensure_not_in_open_transfer(&self.transfer_repo, &mut *tx, &[id], StockAction::RecordUsage).await?;

        // 2. Limite de usos do produto
        let product = self
            .product_repo
            .find_by_barcode(&mut *tx, &unit.barcode)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", unit.barcode)))?;
        let exhausted = usage_exhausted(unit.number_of_uses + 1, product.max_uses);

        // 3. Contadores (+ vazio se esgotou)
        let updated = self
            .stock_repo
            .record_usage(&mut *tx, &unit, employee_id, exhausted)
            .await?;

        // 4. Histórico
        self.stock_repo
            .insert_movements(&mut *tx, &[id], StockMovementKind::UsageRecorded, unit.warehouse_id, employee_id, None, None)
            .await?;
        if exhausted {
            self.stock_repo
                .insert_movements(&mut *tx, &[id], StockMovementKind::MarkedEmpty, unit.warehouse_id, employee_id, None, None)
                .await?;
        }

        tx.commit().await?;

        if exhausted {
            tracing::info!("🪫 Unidade {} esgotada após {} usos", id, updated.number_of_uses);
        }
        Ok(updated)
    }

    /// Baixa de uma unidade (dano, vencimento...). Gera merma de 1 com o custo atual do produto.
    pub async fn delete_unit<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        id: Uuid,
        reason: ShrinkageReason,
        notes: Option<&str>,
    ) -> Result<ProductStock, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !reason.is_manual() {
            return Err(AppError::ReservedShrinkageReason);
        }

        let mut tx = executor.begin().await?;

        // 1. Estado permite a baixa e a unidade não está viajando
        let unit = self.load_unit(&mut *tx, scope, id).await?;
        let to = unit.transition(StockAction::Delete)?;
        ensure_not_in_open_transfer(&self.transfer_repo, &mut *tx, &[id], StockAction::Delete).await?;

        let product = self
            .product_repo
            .find_by_barcode(&mut *tx, &unit.barcode)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", unit.barcode)))?;

        // 2. Unidade
        let deleted = self
            .stock_repo
            .set_state(&mut *tx, id, unit.flags(), to, Some(reason))
            .await?;

        // 3. Histórico + merma
        self.stock_repo
            .insert_movements(&mut *tx, &[id], StockMovementKind::Deleted, unit.warehouse_id, None, None, notes)
            .await?;
        self.shrinkage_repo
            .insert(
                &mut *tx,
                &NewShrinkageEvent {
                    warehouse_id: unit.warehouse_id,
                    barcode: &unit.barcode,
                    product_stock_id: Some(id),
                    transfer_id: None,
                    reason,
                    quantity: 1,
                    unit_cost: product.unit_cost,
                    notes,
                    recorded_by: Some(user_id),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🗑️ Unidade {} ({}) baixada: {}", id, unit.barcode, reason.as_str());
        Ok(deleted)
    }
}
