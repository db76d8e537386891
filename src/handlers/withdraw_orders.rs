// src/handlers/withdraw_orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_audited_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::kits::{AssignmentQuery, ReturnUnitsPayload},
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::WarehouseScope},
    models::withdraw_order::{WithdrawOrder, WithdrawOrderWithDetails},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawOrderPayload {
    pub employee_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemsPayload {
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
}

// POST /api/withdraw-orders
#[utoipa::path(
    post,
    path = "/api/withdraw-orders",
    tag = "Withdraw Orders",
    request_body = CreateWithdrawOrderPayload,
    responses(
        (status = 201, description = "Retirada criada", body = WithdrawOrderWithDetails),
        (status = 409, description = "Unidade não disponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_withdraw_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Json(payload): Json<CreateWithdrawOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .withdraw_order_service
        .create_order(
            &mut *conn,
            scope,
            user.0.id,
            payload.employee_id,
            payload.warehouse_id,
            &payload.product_stock_ids,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/withdraw-orders
#[utoipa::path(
    get,
    path = "/api/withdraw-orders",
    tag = "Withdraw Orders",
    params(AssignmentQuery),
    responses((status = 200, description = "Retiradas no escopo", body = Vec<WithdrawOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_withdraw_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<AssignmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query
        .into_filter(scope)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .withdraw_order_service
        .list_orders(&mut *conn, filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/withdraw-orders/{id}
#[utoipa::path(
    get,
    path = "/api/withdraw-orders/{id}",
    tag = "Withdraw Orders",
    params(("id" = Uuid, Path, description = "ID da retirada")),
    responses(
        (status = 200, description = "Retirada com detalhes", body = WithdrawOrderWithDetails),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_withdraw_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .withdraw_order_service
        .get_order(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/withdraw-orders/{id}/items
#[utoipa::path(
    post,
    path = "/api/withdraw-orders/{id}/items",
    tag = "Withdraw Orders",
    request_body = AddItemsPayload,
    params(("id" = Uuid, Path, description = "ID da retirada")),
    responses(
        (status = 200, description = "Itens adicionados", body = WithdrawOrderWithDetails),
        (status = 409, description = "Retirada concluída ou unidade indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_withdraw_items(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .withdraw_order_service
        .add_items(&mut *conn, scope, id, &payload.product_stock_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/withdraw-orders/{id}/return
#[utoipa::path(
    post,
    path = "/api/withdraw-orders/{id}/return",
    tag = "Withdraw Orders",
    request_body = ReturnUnitsPayload,
    params(("id" = Uuid, Path, description = "ID da retirada")),
    responses(
        (status = 200, description = "Unidades devolvidas", body = WithdrawOrderWithDetails),
        (status = 400, description = "Unidade não pertence à retirada"),
        (status = 409, description = "Retirada já concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn return_withdraw_units(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReturnUnitsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .withdraw_order_service
        .return_units(&mut *conn, scope, id, &payload.product_stock_ids, payload.mark_empty)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}
