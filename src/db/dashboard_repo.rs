// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardSummary, StockCounts},
        replenishment::UnfulfilledOrder,
        stock_limit::LimitLevel,
    },
};

// Todas as consultas aceitam `warehouse_id = None` (escopo global)
#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Resumo Geral
    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Iniciamos uma transação (Snapshot consistente dos dados)
        let mut tx = executor.begin().await?;

        // A. Unidades por estado (mesma precedência de StockState::from_flags)
        let stock = sqlx::query_as::<_, StockCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_deleted AND NOT is_empty AND NOT is_being_used) AS available,
                COUNT(*) FILTER (WHERE NOT is_deleted AND NOT is_empty AND is_being_used AND NOT is_kit) AS in_use,
                COUNT(*) FILTER (WHERE NOT is_deleted AND NOT is_empty AND is_being_used AND is_kit) AS in_kit,
                COUNT(*) FILTER (WHERE NOT is_deleted AND is_empty) AS empty,
                COUNT(*) FILTER (WHERE is_deleted) AS deleted
            FROM product_stock
            WHERE $1::uuid IS NULL OR warehouse_id = $1
            "#,
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        // B. Kits abertos
        let open_kits = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM kits WHERE NOT is_complete AND ($1::uuid IS NULL OR warehouse_id = $1)",
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        // C. Retiradas abertas
        let open_withdraw_orders = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM withdraw_orders WHERE NOT is_complete AND ($1::uuid IS NULL OR warehouse_id = $1)",
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        // D. Transferências pendentes ou em trânsito (origem ou destino)
        let open_transfers = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM warehouse_transfers
            WHERE status IN ('PENDING', 'IN_TRANSIT')
              AND ($1::uuid IS NULL OR source_warehouse_id = $1 OR destination_warehouse_id = $1)
            "#,
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        // E. Pedidos ainda não atendidos
        let unfulfilled_replenishment_orders = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM replenishment_orders
            WHERE status NOT IN ('COMPLETED', 'CANCELLED')
              AND ($1::uuid IS NULL OR warehouse_id = $1 OR cedis_warehouse_id = $1)
            "#,
        )
        .bind(warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        // F. Merma do mês corrente (escopo global não conta o CEDIS, como no relatório)
        let (shrinkage_quantity_this_month, shrinkage_cost_this_month) =
            sqlx::query_as::<_, (i64, Decimal)>(
                r#"
                SELECT COALESCE(SUM(e.quantity), 0)::bigint,
                       COALESCE(SUM(e.quantity * e.unit_cost), 0)
                FROM inventory_shrinkage_events e
                JOIN warehouses w ON w.id = e.warehouse_id
                WHERE e.created_at >= date_trunc('month', NOW())
                  AND (($1::uuid IS NULL AND NOT w.is_cedis) OR e.warehouse_id = $1)
                "#,
            )
            .bind(warehouse_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            stock,
            open_kits,
            open_withdraw_orders,
            open_transfers,
            unfulfilled_replenishment_orders,
            shrinkage_quantity_this_month,
            shrinkage_cost_this_month,
        })
    }

    // 2. Nível atual de cada limite (a classificação LOW/OVER é feita em Rust)
    pub async fn get_limit_levels<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<LimitLevel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let levels = sqlx::query_as::<_, LimitLevel>(
            r#"
            SELECT
                l.id AS limit_id,
                l.warehouse_id,
                w.name AS warehouse_name,
                l.barcode,
                p.name AS product_name,
                l.limit_type,
                l.min_value,
                l.max_value,
                COUNT(s.id)::bigint AS available_units,
                COALESCE(SUM(GREATEST(p.max_uses - s.number_of_uses, 0)), 0)::bigint AS remaining_uses
            FROM stock_limits l
            JOIN warehouses w ON w.id = l.warehouse_id
            JOIN products p ON p.barcode = l.barcode
            LEFT JOIN product_stock s
                ON s.warehouse_id = l.warehouse_id
               AND s.barcode = l.barcode
               AND NOT s.is_deleted AND NOT s.is_empty AND NOT s.is_being_used
            WHERE $1::uuid IS NULL OR l.warehouse_id = $1
            GROUP BY l.id, w.name, p.name
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;
        Ok(levels)
    }

    // 3. Pedidos não atendidos, do mais antigo ao mais novo
    pub async fn get_unfulfilled_orders<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<UnfulfilledOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, UnfulfilledOrder>(
            r#"
            SELECT
                o.id,
                o.warehouse_id,
                w.name AS warehouse_name,
                o.status,
                o.created_at,
                COALESCE(SUM(GREATEST(d.quantity - d.received_quantity, 0)), 0)::bigint AS outstanding_quantity
            FROM replenishment_orders o
            JOIN warehouses w ON w.id = o.warehouse_id
            LEFT JOIN replenishment_order_details d ON d.order_id = o.id
            WHERE o.status NOT IN ('COMPLETED', 'CANCELLED')
              AND ($1::uuid IS NULL OR o.warehouse_id = $1 OR o.cedis_warehouse_id = $1)
            GROUP BY o.id, w.name
            ORDER BY o.created_at ASC
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }
}
