// src/handlers/stock_limits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_audited_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Encargado, RequireRole},
        scope::WarehouseScope,
    },
    models::stock_limit::{LimitType, StockLimit},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockLimitPayload {
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub barcode: String,
    pub limit_type: LimitType,
    #[validate(range(min = 0, message = "not_negative"))]
    pub min_value: i32,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_value: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockLimitPayload {
    pub limit_type: Option<LimitType>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub min_value: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_value: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StockLimitQuery {
    pub warehouse_id: Option<Uuid>,
}

// POST /api/stock-limits
#[utoipa::path(
    post,
    path = "/api/stock-limits",
    tag = "Stock Limits",
    request_body = CreateStockLimitPayload,
    responses(
        (status = 201, description = "Limite criado", body = StockLimit),
        (status = 400, description = "minValue > maxValue"),
        (status = 409, description = "Já existe limite para o par almacén/produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_limit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Json(payload): Json<CreateStockLimitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    scope
        .ensure_allows(payload.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let limit = app_state
        .stock_limit_service
        .create_limit(
            &mut *conn,
            payload.warehouse_id,
            payload.barcode.trim(),
            payload.limit_type,
            payload.min_value,
            payload.max_value,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(limit)))
}

// GET /api/stock-limits
#[utoipa::path(
    get,
    path = "/api/stock-limits",
    tag = "Stock Limits",
    params(StockLimitQuery),
    responses((status = 200, description = "Limites no escopo", body = Vec<StockLimit>)),
    security(("api_jwt" = []))
)]
pub async fn list_limits(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<StockLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let limits = app_state
        .stock_limit_service
        .list_limits(&mut *conn, scope.warehouse_id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(limits)))
}

// PUT /api/stock-limits/{id}
#[utoipa::path(
    put,
    path = "/api/stock-limits/{id}",
    tag = "Stock Limits",
    request_body = UpdateStockLimitPayload,
    params(("id" = Uuid, Path, description = "ID do limite")),
    responses(
        (status = 200, description = "Limite atualizado", body = StockLimit),
        (status = 400, description = "Intervalo inválido após a mescla"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_limit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockLimitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // 1. Carrega e confere o escopo
    let current = app_state
        .stock_limit_service
        .get_limit(&mut *conn, id)
        .await
        .and_then(|limit| scope.ensure_allows(limit.warehouse_id).map(|_| limit))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // 2. Mescla e grava
    let limit = app_state
        .stock_limit_service
        .update_limit(&mut *conn, &current, payload.limit_type, payload.min_value, payload.max_value)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(limit)))
}

// DELETE /api/stock-limits/{id}
#[utoipa::path(
    delete,
    path = "/api/stock-limits/{id}",
    tag = "Stock Limits",
    params(("id" = Uuid, Path, description = "ID do limite")),
    responses(
        (status = 204, description = "Limite removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_limit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .stock_limit_service
        .get_limit(&mut *conn, id)
        .await
        .and_then(|limit| scope.ensure_allows(limit.warehouse_id))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .stock_limit_service
        .delete_limit(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
