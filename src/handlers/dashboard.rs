// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid; // Importante para o Swagger params

use crate::{
    common::{db_utils::get_audited_connection, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::WarehouseScope},
    // Importamos os models para referenciar no Swagger
    models::{dashboard::DashboardSummary, replenishment::UnfulfilledOrder, stock_limit::LowStockEntry},
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contagens por estado, pendências e merma do mês", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso ao almacén")
    ),
    params(
        ("x-warehouse-id" = Option<Uuid>, Header, description = "Almacén (vazio = escopo global)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .dashboard_service
        .get_summary(&mut *conn, scope.warehouse_id())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/low-stock
#[utoipa::path(
    get,
    path = "/api/dashboard/low-stock",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Limites fora do intervalo (LOW primeiro)", body = Vec<LowStockEntry>),
        (status = 401, description = "Não autorizado")
    ),
    params(
        ("x-warehouse-id" = Option<Uuid>, Header, description = "Almacén (vazio = escopo global)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let entries = app_state
        .dashboard_service
        .get_low_stock(&mut *conn, scope.warehouse_id())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/dashboard/unfulfilled-orders
#[utoipa::path(
    get,
    path = "/api/dashboard/unfulfilled-orders",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Pedidos em aberto, do mais antigo ao mais novo", body = Vec<UnfulfilledOrder>),
        (status = 401, description = "Não autorizado")
    ),
    params(
        ("x-warehouse-id" = Option<Uuid>, Header, description = "Almacén (vazio = escopo global)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_unfulfilled_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .dashboard_service
        .get_unfulfilled_orders(&mut *conn, scope.warehouse_id())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}
