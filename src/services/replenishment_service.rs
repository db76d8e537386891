// src/services/replenishment_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProductRepository, ReplenishmentRepository, StockRepository, WarehouseRepository},
    middleware::scope::WarehouseScope,
    models::{
        product_stock::{ensure_batch_ready, StockAction},
        replenishment::{
            ensure_distinct_barcodes, outstanding_quantity, plan_fulfillment, ReplenishmentOrder,
            ReplenishmentOrderWithDetails, ReplenishmentStatus,
        },
    },
    services::transfer_service::TransferService,
};

/// Linha pedida: barcode + quantidade.
#[derive(Debug, Clone)]
pub struct RequestedItem {
    pub barcode: String,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct ReplenishmentService {
    replenishment_repo: ReplenishmentRepository,
    warehouse_repo: WarehouseRepository,
    product_repo: ProductRepository,
    stock_repo: StockRepository,
    transfer_service: TransferService,
}

impl ReplenishmentService {
    pub fn new(
        replenishment_repo: ReplenishmentRepository,
        warehouse_repo: WarehouseRepository,
        product_repo: ProductRepository,
        stock_repo: StockRepository,
        transfer_service: TransferService,
    ) -> Self {
        Self { replenishment_repo, warehouse_repo, product_repo, stock_repo, transfer_service }
    }

    async fn load_order(
        &self,
        conn: &mut PgConnection,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<ReplenishmentOrder, AppError> {
        let order = self
            .replenishment_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("replenishment_order {}", id)))?;
        scope.ensure_allows_either(order.warehouse_id, order.cedis_warehouse_id)?;
        Ok(order)
    }

    // --- CRIAR PEDIDO ---
    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        warehouse_id: Uuid,
        cedis_warehouse_id: Uuid,
        items: &[RequestedItem],
        notes: Option<&str>,
    ) -> Result<ReplenishmentOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        scope.ensure_allows(warehouse_id)?;
        ensure_distinct_barcodes(items.iter().map(|i| i.barcode.as_str()))?;

        let mut tx = executor.begin().await?;

        // 1. Solicitante comum, origem CEDIS
        let requester = self
            .warehouse_repo
            .find_by_id(&mut *tx, warehouse_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", warehouse_id)))?;
        if requester.is_cedis {
            return Err(AppError::RequesterIsCedis);
        }

        let cedis = self
            .warehouse_repo
            .find_by_id(&mut *tx, cedis_warehouse_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("warehouse {}", cedis_warehouse_id)))?;
        if !cedis.is_cedis {
            return Err(AppError::SourceNotCedis);
        }

        // 2. Todos os produtos existem
        let barcodes: Vec<String> = items.iter().map(|i| i.barcode.clone()).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let products = self.product_repo.find_many(&mut *tx, &barcodes).await?;
        if let Some(unknown) = barcodes.iter().find(|b| !products.iter().any(|p| &p.barcode == *b)) {
            return Err(AppError::ResourceNotFound(format!("product {}", unknown)));
        }

        // 3. Pedido + linhas
        let order = self
            .replenishment_repo
            .create(&mut *tx, warehouse_id, cedis_warehouse_id, notes, user_id)
            .await?;
        let details = self
            .replenishment_repo
            .insert_details(&mut *tx, order.id, &barcodes, &quantities)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📝 Pedido {} de {} ao {}: {} unidades",
            order.id,
            requester.code,
            cedis.code,
            outstanding_quantity(&details)
        );
        Ok(ReplenishmentOrderWithDetails { order, details })
    }

    pub async fn get_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<ReplenishmentOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let order = self.load_order(&mut *conn, scope, id).await?;
        let details = self.replenishment_repo.details(&mut *conn, id).await?;
        Ok(ReplenishmentOrderWithDetails { order, details })
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        status: Option<ReplenishmentStatus>,
    ) -> Result<Vec<ReplenishmentOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.replenishment_repo.list(executor, warehouse_id, status).await
    }

    // --- ATENDER (CEDIS separa as unidades e despacha) ---
    pub async fn fulfill_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        id: Uuid,
        product_stock_ids: &[Uuid],
    ) -> Result<ReplenishmentOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Pedido pendente, visto pelo CEDIS
        let order = self.load_order(&mut *tx, scope, id).await?;
        scope.ensure_allows(order.cedis_warehouse_id)?;
        order.status.ensure_pending(ReplenishmentStatus::Sent)?;
        let details = self.replenishment_repo.details(&mut *tx, id).await?;

        // 2. Unidades disponíveis no CEDIS, dentro do pedido
        let units = self.stock_repo.find_many(&mut *tx, product_stock_ids).await?;
        ensure_batch_ready(&units, product_stock_ids, order.cedis_warehouse_id, StockAction::Transfer)?;
        let unit_barcodes: Vec<&str> = product_stock_ids
            .iter()
            .filter_map(|id| units.iter().find(|u| u.id == *id))
            .map(|u| u.barcode.as_str())
            .collect();
        let sent = plan_fulfillment(&details, &unit_barcodes)?;

        // 3. Transferência CEDIS -> solicitante, já em trânsito
        let note = format!("Pedido {}", order.id);
        let created = self
            .transfer_service
            .create_in_tx(
                &mut *tx,
                user_id,
                order.cedis_warehouse_id,
                order.warehouse_id,
                product_stock_ids,
                Some(&note),
            )
            .await?;
        let shipped = self.transfer_service.ship_in_tx(&mut *tx, &created.transfer).await?;

        // 4. Quantidades enviadas + status
        let barcodes: Vec<String> = sent.keys().cloned().collect();
        let quantities: Vec<i32> = sent.values().copied().collect();
        self.replenishment_repo
            .set_sent_quantities(&mut *tx, id, &barcodes, &quantities)
            .await?;
        let order = self
            .replenishment_repo
            .update_status(&mut *tx, id, ReplenishmentStatus::Pending, ReplenishmentStatus::Sent, Some(shipped.id))
            .await?;
        let details = self.replenishment_repo.details(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(
            "🚚 Pedido {} atendido pela transferência {} ({} unidades)",
            order.id,
            shipped.id,
            product_stock_ids.len()
        );
        Ok(ReplenishmentOrderWithDetails { order, details })
    }

    pub async fn cancel_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<ReplenishmentOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.load_order(&mut *tx, scope, id).await?;
        order.status.ensure_pending(ReplenishmentStatus::Cancelled)?;
        let cancelled = self
            .replenishment_repo
            .update_status(&mut *tx, id, ReplenishmentStatus::Pending, ReplenishmentStatus::Cancelled, None)
            .await?;

        tx.commit().await?;
        tracing::info!("🚫 Pedido {} cancelado", id);
        Ok(cancelled)
    }
}
