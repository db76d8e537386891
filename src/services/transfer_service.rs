// src/services/transfer_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        ProductRepository, ReplenishmentRepository, ShrinkageRepository, StockRepository,
        TransferRepository, WarehouseRepository,
    },
    middleware::scope::WarehouseScope,
    models::{
        product_stock::{ensure_batch_ready, ensure_distinct, StockAction, StockMovementKind},
        replenishment::{outstanding_quantity, status_after_receipt, ReplenishmentStatus},
        shrinkage::{NewShrinkageEvent, ShrinkageReason},
        transfer::{
            received_by_barcode, reconcile, TransferReconciliation, TransferStatus,
            TransferWithDetails, WarehouseTransfer,
        },
        warehouse::Warehouse,
    },
    services::stock_service::ensure_not_in_open_transfer,
};

#[derive(Clone)]
pub struct TransferService {
    transfer_repo: TransferRepository,
    stock_repo: StockRepository,
    warehouse_repo: WarehouseRepository,
    product_repo: ProductRepository,
    shrinkage_repo: ShrinkageRepository,
    replenishment_repo: ReplenishmentRepository,
}

impl TransferService {
    pub fn new(
        transfer_repo: TransferRepository,
        stock_repo: StockRepository,
        warehouse_repo: WarehouseRepository,
        product_repo: ProductRepository,
        shrinkage_repo: ShrinkageRepository,
        replenishment_repo: ReplenishmentRepository,
    ) -> Self {
        Self {
            transfer_repo,
            stock_repo,
            warehouse_repo,
            product_repo,
            shrinkage_repo,
            replenishment_repo,
        }
    }

    async fn active_warehouse(&self, conn: &mut PgConnection, id: Uuid) -> Result<Warehouse, AppError> {
        let warehouse = self
            .warehouse_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", id)))?;
        if !warehouse.is_active {
            return Err(AppError::WarehouseInactive(id));
        }
        Ok(warehouse)
    }

    async fn load_transfer(&self, conn: &mut PgConnection, id: Uuid) -> Result<WarehouseTransfer, AppError> {
        self.transfer_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("transfer {}", id)))
    }

    // ---
    // Passos reutilizados pelo atendimento de pedidos (dentro da transação de quem chama)
    // ---

    pub(crate) async fn create_in_tx(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        product_stock_ids: &[Uuid],
        notes: Option<&str>,
    ) -> Result<TransferWithDetails, AppError> {
        if source_warehouse_id == destination_warehouse_id {
            return Err(AppError::SameWarehouseTransfer);
        }

        // 1. Os dois almacenes ativos
        self.active_warehouse(&mut *conn, source_warehouse_id).await?;
        self.active_warehouse(&mut *conn, destination_warehouse_id).await?;

        // 2. Unidades disponíveis na origem e livres de outra transferência
        let units = self.stock_repo.find_many(&mut *conn, product_stock_ids).await?;
        ensure_batch_ready(&units, product_stock_ids, source_warehouse_id, StockAction::Transfer)?;
        ensure_not_in_open_transfer(&self.transfer_repo, &mut *conn, product_stock_ids, StockAction::Transfer).await?;

        // 3. Cabeçalho + detalhes (barcode congelado no detalhe)
        let transfer = self
            .transfer_repo
            .create(&mut *conn, source_warehouse_id, destination_warehouse_id, notes, user_id)
            .await?;
        self.transfer_repo
            .insert_details(&mut *conn, transfer.id, product_stock_ids)
            .await?;
        let details = self.transfer_repo.details(&mut *conn, transfer.id).await?;

        Ok(TransferWithDetails { transfer, details })
    }

    pub(crate) async fn ship_in_tx(
        &self,
        conn: &mut PgConnection,
        transfer: &WarehouseTransfer,
    ) -> Result<WarehouseTransfer, AppError> {
        transfer.status.ensure_can_become(TransferStatus::InTransit)?;

        let shipped = self
            .transfer_repo
            .update_status(&mut *conn, transfer.id, TransferStatus::Pending, TransferStatus::InTransit)
            .await?;

        let details = self.transfer_repo.details(&mut *conn, transfer.id).await?;
        let ids: Vec<Uuid> = details.iter().map(|d| d.product_stock_id).collect();
        self.stock_repo
            .insert_movements(
                &mut *conn,
                &ids,
                StockMovementKind::TransferShipped,
                transfer.source_warehouse_id,
                None,
                Some(transfer.id),
                None,
            )
            .await?;

        Ok(shipped)
    }

    // ---
    // Operações
    // ---

    pub async fn create_transfer<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        source_warehouse_id: Uuid,
        destination_warehouse_id: Uuid,
        product_stock_ids: &[Uuid],
        notes: Option<&str>,
    ) -> Result<TransferWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        scope.ensure_allows(source_warehouse_id)?;
        let mut tx = executor.begin().await?;

        let created = self
            .create_in_tx(
                &mut *tx,
                user_id,
                source_warehouse_id,
                destination_warehouse_id,
                product_stock_ids,
                notes,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🚚 Transferência {} criada: {} unidades de {} para {}",
            created.transfer.id,
            created.details.len(),
            source_warehouse_id,
            destination_warehouse_id
        );
        Ok(created)
    }

    pub async fn get_transfer<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<TransferWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let transfer = self.load_transfer(&mut *conn, id).await?;
        scope.ensure_allows_either(transfer.source_warehouse_id, transfer.destination_warehouse_id)?;
        let details = self.transfer_repo.details(&mut *conn, id).await?;
        Ok(TransferWithDetails { transfer, details })
    }

    pub async fn list_transfers<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        status: Option<TransferStatus>,
    ) -> Result<Vec<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.transfer_repo.list(executor, warehouse_id, status).await
    }

    pub async fn ship_transfer<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self.load_transfer(&mut *tx, id).await?;
        scope.ensure_allows(transfer.source_warehouse_id)?;
        let shipped = self.ship_in_tx(&mut *tx, &transfer).await?;

        tx.commit().await?;
        tracing::info!("📦 Transferência {} em trânsito", id);
        Ok(shipped)
    }

    /// Recebimento parcial: cada unidade passa a pertencer ao destino.
    pub async fn receive_units<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
        product_stock_ids: &[Uuid],
    ) -> Result<TransferWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        ensure_distinct(product_stock_ids)?;
        let mut tx = executor.begin().await?;

        // 1. Só recebe em trânsito
        let transfer = self.load_transfer(&mut *tx, id).await?;
        scope.ensure_allows(transfer.destination_warehouse_id)?;
        if transfer.status != TransferStatus::InTransit {
            return Err(AppError::InvalidStatusTransition {
                entity: "transfer",
                from: transfer.status.as_str().to_string(),
                to: "RECEIVED".to_string(),
            });
        }

        // 2. Cada id é um detalhe ainda não recebido
        let details = self.transfer_repo.details(&mut *tx, id).await?;
        for stock_id in product_stock_ids {
            let detail = details
                .iter()
                .find(|d| d.product_stock_id == *stock_id)
                .ok_or(AppError::NotPartOfTransfer { transfer_id: id, stock_id: *stock_id })?;
            if detail.is_received {
                return Err(AppError::AlreadyReceived(*stock_id));
            }
        }

        // 3. Unidades mudam de almacén
        for stock_id in product_stock_ids {
            self.stock_repo
                .move_to_warehouse(
                    &mut *tx,
                    *stock_id,
                    transfer.source_warehouse_id,
                    transfer.destination_warehouse_id,
                )
                .await?;
        }
        self.transfer_repo.mark_received(&mut *tx, id, product_stock_ids).await?;
        self.stock_repo
            .insert_movements(
                &mut *tx,
                product_stock_ids,
                StockMovementKind::TransferReceived,
                transfer.destination_warehouse_id,
                None,
                Some(id),
                None,
            )
            .await?;

        let details = self.transfer_repo.details(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(TransferWithDetails { transfer, details })
    }

    /// Conciliação: o que não chegou vira baixa + merma na origem.
    pub async fn complete_transfer<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<TransferReconciliation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self.load_transfer(&mut *tx, id).await?;
        scope.ensure_allows(transfer.destination_warehouse_id)?;
        transfer.status.ensure_can_become(TransferStatus::Completed)?;

        // 1. Enviado / recebido / faltante por barcode
        let details = self.transfer_repo.details(&mut *tx, id).await?;
        let lines = reconcile(&details);
        let total_missing: i32 = lines.iter().map(|l| l.missing).sum();

        // 2. Unidades faltantes -> Deleted (MISSING_TRANSFER)
        let missing_ids: Vec<Uuid> = details
            .iter()
            .filter(|d| !d.is_received)
            .map(|d| d.product_stock_id)
            .collect();

        if !missing_ids.is_empty() {
            let units = self.stock_repo.find_many(&mut *tx, &missing_ids).await?;
            for unit in &units {
                let to = unit.transition(StockAction::Delete)?;
                self.stock_repo
                    .set_state(&mut *tx, unit.id, unit.flags(), to, Some(ShrinkageReason::MissingTransfer))
                    .await?;
            }
            self.stock_repo
                .insert_movements(
                    &mut *tx,
                    &missing_ids,
                    StockMovementKind::TransferMissing,
                    transfer.source_warehouse_id,
                    None,
                    Some(id),
                    None,
                )
                .await?;
        }

        // 3. Uma merma por barcode com faltante, custo congelado do produto
        let missing_barcodes: Vec<String> = lines
            .iter()
            .filter(|l| l.missing > 0)
            .map(|l| l.barcode.clone())
            .collect();
        let products = self.product_repo.find_many(&mut *tx, &missing_barcodes).await?;

        for line in lines.iter().filter(|l| l.missing > 0) {
            let product = products
                .iter()
                .find(|p| p.barcode == line.barcode)
                .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", line.barcode)))?;

            self.shrinkage_repo
                .insert(
                    &mut *tx,
                    &NewShrinkageEvent {
                        warehouse_id: transfer.source_warehouse_id,
                        barcode: &line.barcode,
                        product_stock_id: None,
                        transfer_id: Some(id),
                        reason: ShrinkageReason::MissingTransfer,
                        quantity: line.missing,
                        unit_cost: product.unit_cost,
                        notes: None,
                        recorded_by: Some(user_id),
                    },
                )
                .await?;
        }

        // 4. A merma da transferência fecha com os faltantes
        let recorded = self.shrinkage_repo.total_for_transfer(&mut *tx, id).await?;
        if recorded != i64::from(total_missing) {
            return Err(anyhow::anyhow!(
                "Merma da transferência {} ({}) difere dos faltantes ({})",
                id,
                recorded,
                total_missing
            )
            .into());
        }

        let completed = self
            .transfer_repo
            .update_status(&mut *tx, id, TransferStatus::InTransit, TransferStatus::Completed)
            .await?;

        // 5. Pedido de reposição vinculado
        if let Some(order) = self.replenishment_repo.find_by_transfer(&mut *tx, id).await? {
            let received = received_by_barcode(&lines);
            let barcodes: Vec<String> = received.keys().cloned().collect();
            let quantities: Vec<i32> = received.values().copied().collect();

            let order_details = self
                .replenishment_repo
                .set_received_quantities(&mut *tx, order.id, &barcodes, &quantities)
                .await?;
            let next = status_after_receipt(&order_details);
            self.replenishment_repo
                .update_status(&mut *tx, order.id, ReplenishmentStatus::Sent, next, None)
                .await?;

            tracing::info!(
                "📋 Pedido {} -> {} ({} pendentes)",
                order.id,
                next.as_str(),
                outstanding_quantity(&order_details)
            );
        }

        tx.commit().await?;

        tracing::info!("✅ Transferência {} conciliada: {} unidades faltantes", id, total_missing);
        Ok(TransferReconciliation { transfer: completed, lines, total_missing })
    }

    pub async fn cancel_transfer<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self.load_transfer(&mut *tx, id).await?;
        scope.ensure_allows(transfer.source_warehouse_id)?;
        transfer.status.ensure_can_become(TransferStatus::Cancelled)?;

        let cancelled = self
            .transfer_repo
            .update_status(&mut *tx, id, TransferStatus::Pending, TransferStatus::Cancelled)
            .await?;

        tx.commit().await?;
        tracing::info!("🚫 Transferência {} cancelada", id);
        Ok(cancelled)
    }
}
