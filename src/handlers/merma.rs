// src/handlers/merma.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
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
    db::shrinkage_repo::ShrinkageFilter,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Encargado, RequireRole},
        scope::WarehouseScope,
    },
    models::shrinkage::{ShrinkageEvent, ShrinkageReason, ShrinkageSummary},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordShrinkagePayload {
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub barcode: String,
    #[validate(range(min = 1, message = "positive"))]
    pub quantity: i32,
    /// `MISSING_TRANSFER` é reservado à conciliação de transferências
    pub reason: ShrinkageReason,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShrinkageQuery {
    pub warehouse_id: Option<Uuid>,
    pub reason: Option<ShrinkageReason>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShrinkageSummaryQuery {
    /// Sem almacén: todos, exceto CEDIS
    pub warehouse_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// GET /api/merma
#[utoipa::path(
    get,
    path = "/api/merma",
    tag = "Merma",
    params(ShrinkageQuery),
    responses((status = 200, description = "Eventos de merma no escopo", body = Vec<ShrinkageEvent>)),
    security(("api_jwt" = []))
)]
pub async fn list_shrinkage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<ShrinkageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let filter = ShrinkageFilter {
        warehouse_id: scope.warehouse_id(),
        reason: query.reason,
        from: query.from,
        to: query.to,
    };

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let events = app_state
        .shrinkage_service
        .list_events(&mut *conn, filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(events)))
}

// POST /api/merma
#[utoipa::path(
    post,
    path = "/api/merma",
    tag = "Merma",
    request_body = RecordShrinkagePayload,
    responses(
        (status = 201, description = "Merma registrada", body = ShrinkageEvent),
        (status = 400, description = "Motivo reservado ou quantidade inválida"),
        (status = 404, description = "Produto inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_shrinkage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Json(payload): Json<RecordShrinkagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let event = app_state
        .shrinkage_service
        .record_event(
            &mut *conn,
            scope,
            user.0.id,
            payload.warehouse_id,
            payload.barcode.trim(),
            payload.quantity,
            payload.reason,
            payload.notes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(event)))
}

// GET /api/merma/summary
#[utoipa::path(
    get,
    path = "/api/merma/summary",
    tag = "Merma",
    params(ShrinkageSummaryQuery),
    responses(
        (status = 200, description = "Totais por motivo, almacén e produto", body = ShrinkageSummary),
        (status = 403, description = "Apenas ENCARGADO ou ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn shrinkage_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Query(query): Query<ShrinkageSummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .shrinkage_service
        .summary(&mut *conn, scope.warehouse_id(), query.from, query.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
