// src/handlers/kits.rs

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
    db::kit_repo::AssignmentFilter,
    middleware::{auth::AuthenticatedUser, i18n::Locale, scope::WarehouseScope},
    models::kit::{Kit, KitWithDetails},
};

// ---
// Payloads (a devolução e o filtro também servem às retiradas)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateKitPayload {
    pub employee_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnUnitsPayload {
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
    /// Devolve as unidades já vazias
    #[serde(default)]
    pub mark_empty: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentQuery {
    pub warehouse_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    /// `true` = só em aberto, `false` = só concluídos
    pub open: Option<bool>,
}

impl AssignmentQuery {
    pub(crate) fn into_filter(self, scope: WarehouseScope) -> Result<AssignmentFilter, AppError> {
        let scope = scope.narrow(self.warehouse_id)?;
        Ok(AssignmentFilter {
            warehouse_id: scope.warehouse_id(),
            employee_id: self.employee_id,
            open: self.open,
        })
    }
}

// POST /api/kits
#[utoipa::path(
    post,
    path = "/api/kits",
    tag = "Kits",
    request_body = CreateKitPayload,
    responses(
        (status = 201, description = "Kit atribuído", body = KitWithDetails),
        (status = 400, description = "Unidade repetida, de outro almacén ou empleado inválido"),
        (status = 409, description = "Unidade não disponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_kit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Json(payload): Json<CreateKitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let kit = app_state
        .kit_service
        .create_kit(
            &mut *conn,
            scope,
            user.0.id,
            payload.employee_id,
            payload.warehouse_id,
            &payload.product_stock_ids,
            payload.observations.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(kit)))
}

// GET /api/kits
#[utoipa::path(
    get,
    path = "/api/kits",
    tag = "Kits",
    params(AssignmentQuery),
    responses((status = 200, description = "Kits no escopo", body = Vec<Kit>)),
    security(("api_jwt" = []))
)]
pub async fn list_kits(
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

    let kits = app_state
        .kit_service
        .list_kits(&mut *conn, filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(kits)))
}

// GET /api/kits/{id}
#[utoipa::path(
    get,
    path = "/api/kits/{id}",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    responses(
        (status = 200, description = "Kit com detalhes", body = KitWithDetails),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_kit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let kit = app_state
        .kit_service
        .get_kit(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(kit)))
}

// POST /api/kits/{id}/return
#[utoipa::path(
    post,
    path = "/api/kits/{id}/return",
    tag = "Kits",
    request_body = ReturnUnitsPayload,
    params(("id" = Uuid, Path, description = "ID do kit")),
    responses(
        (status = 200, description = "Unidades devolvidas", body = KitWithDetails),
        (status = 400, description = "Unidade não pertence ao kit ou já foi devolvida"),
        (status = 409, description = "Kit já concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn return_kit_units(
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

    let kit = app_state
        .kit_service
        .return_units(&mut *conn, scope, id, &payload.product_stock_ids, payload.mark_empty)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(kit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_unit_list_is_rejected() {
        let payload: CreateKitPayload = serde_json::from_value(serde_json::json!({
            "employeeId": Uuid::new_v4(),
            "warehouseId": Uuid::new_v4(),
            "productStockIds": []
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        let ids = &fields["product_stock_ids"][0];
        assert_eq!(ids.message.as_deref(), Some("at_least_one"));
    }

    #[test]
    fn mark_empty_defaults_to_false() {
        let payload: ReturnUnitsPayload =
            serde_json::from_value(serde_json::json!({ "productStockIds": [Uuid::new_v4()] })).unwrap();
        assert!(!payload.mark_empty);
    }

    #[test]
    fn query_filter_respects_scope() {
        let own = Uuid::new_v4();
        let query = AssignmentQuery { warehouse_id: None, employee_id: None, open: Some(true) };
        let filter = query.into_filter(WarehouseScope::Warehouse(own)).unwrap();
        assert_eq!(filter.warehouse_id, Some(own));
        assert_eq!(filter.open, Some(true));

        let query = AssignmentQuery { warehouse_id: Some(Uuid::new_v4()), employee_id: None, open: None };
        assert!(matches!(
            query.into_filter(WarehouseScope::Warehouse(own)),
            Err(AppError::WarehouseScopeDenied(_))
        ));
    }
}
