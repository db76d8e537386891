// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_users,
        handlers::auth::update_user,

        // --- Warehouses ---
        handlers::warehouses::create_warehouse,
        handlers::warehouses::list_warehouses,
        handlers::warehouses::get_warehouse,
        handlers::warehouses::update_warehouse,
        handlers::warehouses::create_cabinet,
        handlers::warehouses::list_cabinets,

        // --- Employees ---
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::deactivate_employee,

        // --- Products ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,

        // --- Product Stock ---
        handlers::product_stock::create_stock,
        handlers::product_stock::list_stock,
        handlers::product_stock::get_stock,
        handlers::product_stock::get_stock_history,
        handlers::product_stock::mark_empty,
        handlers::product_stock::record_usage,
        handlers::product_stock::delete_stock,

        // --- Stock Limits ---
        handlers::stock_limits::create_limit,
        handlers::stock_limits::list_limits,
        handlers::stock_limits::update_limit,
        handlers::stock_limits::delete_limit,

        // --- Kits ---
        handlers::kits::create_kit,
        handlers::kits::list_kits,
        handlers::kits::get_kit,
        handlers::kits::return_kit_units,

        // --- Withdraw Orders ---
        handlers::withdraw_orders::create_withdraw_order,
        handlers::withdraw_orders::list_withdraw_orders,
        handlers::withdraw_orders::get_withdraw_order,
        handlers::withdraw_orders::add_withdraw_items,
        handlers::withdraw_orders::return_withdraw_units,

        // --- Transfers ---
        handlers::transfers::create_transfer,
        handlers::transfers::list_transfers,
        handlers::transfers::get_transfer,
        handlers::transfers::ship_transfer,
        handlers::transfers::receive_transfer_units,
        handlers::transfers::complete_transfer,
        handlers::transfers::cancel_transfer,

        // --- Merma ---
        handlers::merma::list_shrinkage,
        handlers::merma::record_shrinkage,
        handlers::merma::shrinkage_summary,

        // --- Replenishment ---
        handlers::replenishment::create_replenishment_order,
        handlers::replenishment::list_replenishment_orders,
        handlers::replenishment::get_replenishment_order,
        handlers::replenishment::fulfill_replenishment_order,
        handlers::replenishment::cancel_replenishment_order,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_low_stock,
        handlers::dashboard::get_unfulfilled_orders,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,

            // --- Warehouses ---
            models::warehouse::Warehouse,
            models::warehouse::Cabinet,
            models::warehouse::CabinetView,
            models::employee::Employee,
            models::product::Product,

            // --- Stock ---
            models::product_stock::StockState,
            models::product_stock::ProductStock,
            models::product_stock::ProductStockView,
            models::product_stock::StockMovementKind,
            models::product_stock::StockMovement,
            models::stock_limit::LimitType,
            models::stock_limit::StockLimit,
            models::stock_limit::LimitStatus,
            models::stock_limit::LowStockEntry,

            // --- Assignments ---
            models::kit::Kit,
            models::kit::KitDetail,
            models::kit::KitWithDetails,
            models::withdraw_order::WithdrawOrder,
            models::withdraw_order::WithdrawOrderDetail,
            models::withdraw_order::WithdrawOrderWithDetails,

            // --- Transfers ---
            models::transfer::TransferStatus,
            models::transfer::WarehouseTransfer,
            models::transfer::TransferDetail,
            models::transfer::TransferWithDetails,
            models::transfer::ReconciliationLine,
            models::transfer::TransferReconciliation,

            // --- Merma ---
            models::shrinkage::ShrinkageReason,
            models::shrinkage::ShrinkageEvent,
            models::shrinkage::ShrinkageBucket,
            models::shrinkage::ShrinkageSummary,

            // --- Replenishment ---
            models::replenishment::ReplenishmentStatus,
            models::replenishment::ReplenishmentOrder,
            models::replenishment::ReplenishmentDetail,
            models::replenishment::ReplenishmentOrderWithDetails,
            models::replenishment::UnfulfilledOrder,

            // --- Dashboard ---
            models::dashboard::StockCounts,
            models::dashboard::DashboardSummary,

            // --- Payloads ---
            handlers::warehouses::CreateWarehousePayload,
            handlers::warehouses::UpdateWarehousePayload,
            handlers::employees::CreateEmployeePayload,
            handlers::employees::UpdateEmployeePayload,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,
            handlers::product_stock::CreateStockPayload,
            handlers::product_stock::RecordUsagePayload,
            handlers::product_stock::DeleteStockPayload,
            handlers::stock_limits::CreateStockLimitPayload,
            handlers::stock_limits::UpdateStockLimitPayload,
            handlers::kits::CreateKitPayload,
            handlers::kits::ReturnUnitsPayload,
            handlers::withdraw_orders::CreateWithdrawOrderPayload,
            handlers::withdraw_orders::AddItemsPayload,
            handlers::transfers::CreateTransferPayload,
            handlers::transfers::ReceiveUnitsPayload,
            handlers::merma::RecordShrinkagePayload,
            handlers::replenishment::RequestedItemPayload,
            handlers::replenishment::CreateReplenishmentPayload,
            handlers::replenishment::FulfillPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários, papéis e almacén atribuído"),
        (name = "Warehouses", description = "Almacenes, CEDIS e gabinetes"),
        (name = "Employees", description = "Empleados que recebem kits e retiradas"),
        (name = "Products", description = "Catálogo por código de barras"),
        (name = "Product Stock", description = "Unidades físicas e sua máquina de estados"),
        (name = "Stock Limits", description = "Mínimos e máximos por almacén"),
        (name = "Kits", description = "Kits atribuídos a empleados"),
        (name = "Withdraw Orders", description = "Retiradas de unidades"),
        (name = "Transfers", description = "Transferências entre almacenes e conciliação"),
        (name = "Merma", description = "Perdas e baixas de inventário"),
        (name = "Replenishment Orders", description = "Pedidos de reposição ao CEDIS"),
        (name = "Dashboard", description = "Indicadores do almacén")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/product-stock/{id}/usage",
            "/api/transfers/{id}/complete",
            "/api/merma/summary",
            "/api/replenishment-orders/{id}/fulfill",
            "/api/dashboard/low-stock",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltou {}", path);
        }
        let schemes = doc.components.as_ref().map(|c| c.security_schemes.contains_key("api_jwt"));
        assert_eq!(schemes, Some(true));
    }
}
