// src/handlers/transfers.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::WarehouseScope},
    models::transfer::{TransferReconciliation, TransferStatus, TransferWithDetails, WarehouseTransfer},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferPayload {
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveUnitsPayload {
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransferQuery {
    /// Origem ou destino
    pub warehouse_id: Option<Uuid>,
    pub status: Option<TransferStatus>,
}

// POST /api/transfers
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Transfers",
    request_body = CreateTransferPayload,
    responses(
        (status = 201, description = "Transferência pendente", body = TransferWithDetails),
        (status = 400, description = "Origem igual ao destino ou almacén inativo"),
        (status = 409, description = "Unidade indisponível ou já em outra transferência")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Json(payload): Json<CreateTransferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .transfer_service
        .create_transfer(
            &mut *conn,
            scope,
            user.0.id,
            payload.source_warehouse_id,
            payload.destination_warehouse_id,
            &payload.product_stock_ids,
            payload.notes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

// GET /api/transfers
#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "Transfers",
    params(TransferQuery),
    responses((status = 200, description = "Transferências no escopo", body = Vec<WarehouseTransfer>)),
    security(("api_jwt" = []))
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<TransferQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfers = app_state
        .transfer_service
        .list_transfers(&mut *conn, scope.warehouse_id(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfers)))
}

// GET /api/transfers/{id}
#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Transferência com detalhes", body = TransferWithDetails),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .transfer_service
        .get_transfer(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}

// POST /api/transfers/{id}/ship
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/ship",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Em trânsito", body = WarehouseTransfer),
        (status = 409, description = "Status não permite envio")
    ),
    security(("api_jwt" = []))
)]
pub async fn ship_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .transfer_service
        .ship_transfer(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}

// POST /api/transfers/{id}/receive
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/receive",
    tag = "Transfers",
    request_body = ReceiveUnitsPayload,
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Unidades recebidas no destino", body = TransferWithDetails),
        (status = 400, description = "Unidade fora da transferência ou já recebida"),
        (status = 409, description = "Transferência não está em trânsito")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_transfer_units(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceiveUnitsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .transfer_service
        .receive_units(&mut *conn, scope, id, &payload.product_stock_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}

// POST /api/transfers/{id}/complete
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/complete",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Conciliação por código de barras", body = TransferReconciliation),
        (status = 409, description = "Transferência não está em trânsito")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reconciliation = app_state
        .transfer_service
        .complete_transfer(&mut *conn, scope, user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reconciliation)))
}

// POST /api/transfers/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/cancel",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Cancelada", body = WarehouseTransfer),
        (status = 409, description = "Só transferências pendentes podem ser canceladas")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .transfer_service
        .cancel_transfer(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}
