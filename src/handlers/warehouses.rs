// src/handlers/warehouses.rs

use axum::{
    extract::{Path, State},
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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Admin, RequireRole},
    },
    models::warehouse::{Cabinet, CabinetView, Warehouse},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Sucursal Norte")]
    pub name: String,

    #[validate(length(min = 1, max = 32, message = "required"))]
    #[schema(example = "SUC-NTE")]
    pub code: String,

    #[serde(default)]
    pub is_cedis: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehousePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

// POST /api/warehouses
#[utoipa::path(
    post,
    path = "/api/warehouses",
    tag = "Warehouses",
    request_body = CreateWarehousePayload,
    responses(
        (status = 201, description = "Almacén criado (com gabinete, se não for CEDIS)", body = Warehouse),
        (status = 403, description = "Apenas ADMIN"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_warehouse(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Admin>,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let warehouse = app_state
        .warehouse_service
        .create_warehouse(&mut *conn, payload.name.trim(), payload.code.trim(), payload.is_cedis)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(warehouse)))
}

// GET /api/warehouses
#[utoipa::path(
    get,
    path = "/api/warehouses",
    tag = "Warehouses",
    responses((status = 200, description = "Lista de almacenes", body = Vec<Warehouse>)),
    security(("api_jwt" = []))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let warehouses = app_state
        .warehouse_service
        .list_warehouses(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(warehouses)))
}

// GET /api/warehouses/{id}
#[utoipa::path(
    get,
    path = "/api/warehouses/{id}",
    tag = "Warehouses",
    params(("id" = Uuid, Path, description = "ID do almacén")),
    responses(
        (status = 200, description = "Almacén", body = Warehouse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_warehouse(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let warehouse = app_state
        .warehouse_service
        .get_warehouse(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(warehouse)))
}

// PUT /api/warehouses/{id}
#[utoipa::path(
    put,
    path = "/api/warehouses/{id}",
    tag = "Warehouses",
    request_body = UpdateWarehousePayload,
    params(("id" = Uuid, Path, description = "ID do almacén")),
    responses(
        (status = 200, description = "Almacén atualizado", body = Warehouse),
        (status = 403, description = "Apenas ADMIN"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_warehouse(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWarehousePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let warehouse = app_state
        .warehouse_service
        .update_warehouse(&mut *conn, id, payload.name.as_deref(), payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(warehouse)))
}

// POST /api/warehouses/{id}/cabinet
#[utoipa::path(
    post,
    path = "/api/warehouses/{id}/cabinet",
    tag = "Warehouses",
    params(("id" = Uuid, Path, description = "ID do almacén")),
    responses(
        (status = 201, description = "Gabinete criado", body = Cabinet),
        (status = 400, description = "CEDIS não tem gabinete"),
        (status = 409, description = "Gabinete já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cabinet(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cabinet = app_state
        .warehouse_service
        .create_cabinet(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cabinet)))
}

// GET /api/cabinets
#[utoipa::path(
    get,
    path = "/api/cabinets",
    tag = "Warehouses",
    responses((status = 200, description = "Gabinetes com o nome do almacén", body = Vec<CabinetView>)),
    security(("api_jwt" = []))
)]
pub async fn list_cabinets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cabinets = app_state
        .warehouse_service
        .list_cabinets(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cabinets)))
}
