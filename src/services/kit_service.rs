// src/services/kit_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{kit_repo::AssignmentFilter, EmployeeRepository, KitRepository, StockRepository, TransferRepository},
    middleware::scope::WarehouseScope,
    models::{
        assignment::{is_complete, plan_return},
        kit::{Kit, KitWithDetails},
        product_stock::{StockAction, StockMovementKind},
    },
    services::stock_service::{check_out_units, return_units},
};

#[derive(Clone)]
pub struct KitService {
    kit_repo: KitRepository,
    employee_repo: EmployeeRepository,
    stock_repo: StockRepository,
    transfer_repo: TransferRepository,
}

impl KitService {
    pub fn new(
        kit_repo: KitRepository,
        employee_repo: EmployeeRepository,
        stock_repo: StockRepository,
        transfer_repo: TransferRepository,
    ) -> Self {
        Self { kit_repo, employee_repo, stock_repo, transfer_repo }
    }

    async fn load_kit(&self, conn: &mut PgConnection, scope: WarehouseScope, id: Uuid) -> Result<Kit, AppError> {
        let kit = self
            .kit_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("kit {}", id)))?;
        scope.ensure_allows(kit.warehouse_id)?;
        Ok(kit)
    }

    // --- CRIAR KIT ---
    pub async fn create_kit<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        user_id: Uuid,
        employee_id: Uuid,
        warehouse_id: Uuid,
        product_stock_ids: &[Uuid],
        observations: Option<&str>,
    ) -> Result<KitWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        scope.ensure_allows(warehouse_id)?;
        let mut tx = executor.begin().await?;

        // 1. Empleado ativo e do mesmo almacén
        let employee = self
            .employee_repo
            .find_by_id(&mut *tx, employee_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", employee_id)))?;
        employee.ensure_can_check_out(warehouse_id)?;

        // 2. Unidades -> InKit
        check_out_units(
            &self.stock_repo,
            &self.transfer_repo,
            &mut *tx,
            product_stock_ids,
            warehouse_id,
            employee_id,
            StockAction::AssignToKit,
        )
        .await?;

        // 3. Kit + detalhes + histórico
        let kit = self
            .kit_repo
            .create(&mut *tx, employee_id, warehouse_id, observations, user_id)
            .await?;
        self.kit_repo.insert_details(&mut *tx, kit.id, product_stock_ids).await?;
        self.stock_repo
            .insert_movements(
                &mut *tx,
                product_stock_ids,
                StockMovementKind::KitAssigned,
                warehouse_id,
                Some(employee_id),
                Some(kit.id),
                None,
            )
            .await?;

        let details = self.kit_repo.details(&mut *tx, kit.id).await?;
        tx.commit().await?;

        tracing::info!(
            "🧰 Kit {} criado para {} {} com {} unidades",
            kit.id,
            employee.name,
            employee.surname,
            details.len()
        );
        Ok(KitWithDetails { kit, details })
    }

    pub async fn get_kit<'e, E>(&self, executor: E, scope: WarehouseScope, id: Uuid) -> Result<KitWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let kit = self.load_kit(&mut *conn, scope, id).await?;
        let details = self.kit_repo.details(&mut *conn, id).await?;
        Ok(KitWithDetails { kit, details })
    }

    pub async fn list_kits<'e, E>(&self, executor: E, filter: AssignmentFilter) -> Result<Vec<Kit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.kit_repo.list(executor, filter).await
    }

    // --- DEVOLUÇÃO (parcial ou total) ---
    pub async fn return_units<'e, E>(
        &self,
        executor: E,
        scope: WarehouseScope,
        kit_id: Uuid,
        product_stock_ids: &[Uuid],
        mark_empty: bool,
    ) -> Result<KitWithDetails, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Kit aberto (travado até o commit) e plano de devolução
        let kit = self.load_kit(&mut *tx, scope, kit_id).await?;
        let mut kit = self
            .kit_repo
            .lock_open(&mut *tx, kit.id)
            .await?
            .ok_or(AppError::AssignmentAlreadyComplete(kit.id))?;
        let details = self.kit_repo.details(&mut *tx, kit.id).await?;
        let plan = plan_return(kit.id, &details, product_stock_ids)?;

        // 2. Unidades voltam (Available ou Empty)
        return_units(&self.stock_repo, &mut *tx, &plan.product_stock_ids, mark_empty).await?;
        self.kit_repo.mark_returned(&mut *tx, &plan.detail_ids).await?;
        self.stock_repo
            .insert_movements(
                &mut *tx,
                &plan.product_stock_ids,
                StockMovementKind::KitReturned,
                kit.warehouse_id,
                Some(kit.employee_id),
                Some(kit.id),
                mark_empty.then_some("empty"),
            )
            .await?;

        // 3. Fecha o kit quando tudo voltou
        let details = self.kit_repo.details(&mut *tx, kit.id).await?;
        if is_complete(&details) {
            kit = self.kit_repo.complete(&mut *tx, kit.id).await?;
            tracing::info!("✅ Kit {} completo", kit.id);
        }

        tx.commit().await?;

        Ok(KitWithDetails { kit, details })
    }
}
