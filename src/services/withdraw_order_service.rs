// src/services/withdraw_order_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        kit_repo::AssignmentFilter, EmployeeRepository, StockRepository, TransferRepository,
        WithdrawOrderRepository,
    },
    middleware::scope::WarehouseScope,
    models::{
        assignment::{is_complete, plan_return},
        product_stock::{StockAction, StockMovementKind},
        withdraw_order::{WithdrawOrder, WithdrawOrderWithDetails},
    },
    services::stock_service::{check_out_units, return_units},
};

#[derive(Clone)]
pub struct WithdrawOrderService {
    withdraw_repo: WithdrawOrderRepository,
    employee_repo: EmployeeRepository,
    stock_repo: StockRepository,
    transfer_repo: TransferRepository,
}

impl WithdrawOrderService {
    pub fn new(
        withdraw_repo: WithdrawOrderRepository,
        employee_repo: EmployeeRepository,
        stock_repo: StockRepository,
        transfer_repo: TransferRepository,
    ) -> Self {
        Self { withdraw_repo, employee_repo, stock_repo, transfer_repo }
    }

    async fn load_order(
        &self,
        conn: &mut PgConnection,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<WithdrawOrder, AppError> {
        let order = self
            .withdraw_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("withdraw_order {}", id)))?;
        scope.ensure_allows(order.warehouse_id)?;
        Ok(order)
    }

    async fn lock_open(&self, conn: &mut PgConnection, order: &WithdrawOrder) -> Result<WithdrawOrder, AppError> {
        self.withdraw_repo
            .lock_open(&mut *conn, order.id)
            .await?
            .ok_or(AppError::AssignmentAlreadyComplete(order.id))
    }

    // Checkout + detalhes + contagem, comum a criar e adicionar itens
    async fn withdraw(
        &self,
        conn: &mut PgConnection,
        order: &WithdrawOrder,
        product_stock_ids: &[Uuid],
    ) -> Result<WithdrawOrder, AppError> {
        let employee = self
            .employee_repo
            .find_by_id(&mut *conn, order.employee_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", order.employee_id)))?;
        employee.ensure_can_check_out(order.warehouse_id)?;

        check_out_units(
            &self.stock_repo,
            &self.transfer_repo,
            &mut *conn,
            product_stock_ids,
            order.warehouse_id,
            order.employee_id,
            StockAction::CheckOut,
        )
        .await?;

        self.withdraw_repo.insert_details(&mut *conn, order.id, product_stock_ids).await?;
        self.stock_repo
            .insert_movements(
                &mut *conn,
                product_stock_ids,
                StockMovementKind::CheckedOut,
                order.warehouse_id,
                Some(order.employee_id),
                Some(order.id),
                None,
            )
            .await?;

        self.withdraw_repo.refresh_num_items(&mut *conn, order.id).await
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        employee_id: Uuid,
        warehouse_id: Uuid,
        product_stock_ids: &[Uuid],
    ) -> Result<WithdrawOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        scope.ensure_allows(warehouse_id)?;
        let mut tx = executor.begin().await?;

        let order = self
            .withdraw_repo
            .create(&mut *tx, employee_id, warehouse_id, user_id)
            .await?;
        let order = self.withdraw(&mut *tx, &order, product_stock_ids).await?;
        let details = self.withdraw_repo.details(&mut *tx, order.id).await?;

        tx.commit().await?;

        tracing::info!("📤 Retirada {} aberta com {} unidades", order.id, order.num_items);
        Ok(WithdrawOrderWithDetails { order, details })
    }

    pub async fn add_items<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        order_id: Uuid,
        product_stock_ids: &[Uuid],
    ) -> Result<WithdrawOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.load_order(&mut *tx, scope, order_id).await?;
        let order = self.lock_open(&mut *tx, &order).await?;
        let order = self.withdraw(&mut *tx, &order, product_stock_ids).await?;
        let details = self.withdraw_repo.details(&mut *tx, order.id).await?;

        tx.commit().await?;
        Ok(WithdrawOrderWithDetails { order, details })
    }

    pub async fn get_order<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        id: Uuid,
    ) -> Result<WithdrawOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let order = self.load_order(&mut *conn, scope, id).await?;
        let details = self.withdraw_repo.details(&mut *conn, id).await?;
        Ok(WithdrawOrderWithDetails { order, details })
    }

    pub async fn list_orders<'e, E>(&self, executor: E, filter: AssignmentFilter) -> Result<Vec<WithdrawOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.withdraw_repo.list(executor, filter).await
    }

    pub async fn return_units<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        order_id: Uuid,
        product_stock_ids: &[Uuid],
        mark_empty: bool,
    ) -> Result<WithdrawOrderWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.load_order(&mut *tx, scope, order_id).await?;
        let mut order = self.lock_open(&mut *tx, &order).await?;
        let details = self.withdraw_repo.details(&mut *tx, order.id).await?;
        let plan = plan_return(order.id, &details, product_stock_ids)?;

        return_units(&self.stock_repo, &mut *tx, &plan.product_stock_ids, mark_empty).await?;
        self.withdraw_repo.mark_returned(&mut *tx, &plan.detail_ids).await?;
        self.stock_repo
            .insert_movements(
                &mut *tx,
                &plan.product_stock_ids,
                StockMovementKind::Returned,
                order.warehouse_id,
                Some(order.employee_id),
                Some(order.id),
                mark_empty.then_some("empty"),
            )
            .await?;

        // Completa com base nos detalhes relidos, depois da trava
        let details = self.withdraw_repo.details(&mut *tx, order.id).await?;
        if is_complete(&details) {
            order = self.withdraw_repo.complete(&mut *tx, order.id).await?;
            tracing::info!("✅ Retirada {} completa", order.id);
        }

        tx.commit().await?;

        Ok(WithdrawOrderWithDetails { order, details })
    }
}
