// src/handlers/replenishment.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
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
    models::replenishment::{ReplenishmentOrder, ReplenishmentOrderWithDetails, ReplenishmentStatus},
    services::replenishment_service::RequestedItem,
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItemPayload {
    #[validate(length(min = 1, message = "required"))]
    pub barcode: String,
    #[validate(range(min = 1, message = "positive"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplenishmentPayload {
    /// Almacén que pede
    pub warehouse_id: Uuid,
    /// CEDIS que atende
    pub cedis_warehouse_id: Uuid,
    #[validate(length(min = 1, message = "at_least_one"))]
    #[validate(nested)]
    pub items: Vec<RequestedItemPayload>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FulfillPayload {
    #[validate(length(min = 1, message = "at_least_one"))]
    pub product_stock_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReplenishmentQuery {
    /// Solicitante ou CEDIS
    pub warehouse_id: Option<Uuid>,
    pub status: Option<ReplenishmentStatus>,
}

// POST /api/replenishment-orders
#[utoipa::path(
    post,
    path = "/api/replenishment-orders",
    tag = "Replenishment Orders",
    request_body = CreateReplenishmentPayload,
    responses(
        (status = 201, description = "Pedido criado", body = ReplenishmentOrderWithDetails),
        (status = 400, description = "Solicitante é CEDIS, origem não é CEDIS ou código repetido"),
        (status = 404, description = "Produto ou almacén inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_replenishment_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Json(payload): Json<CreateReplenishmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let items: Vec<RequestedItem> = payload
        .items
        .into_iter()
        .map(|item| RequestedItem { barcode: item.barcode.trim().to_string(), quantity: item.quantity })
        .collect();

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .replenishment_service
        .create_order(
            &mut *conn,
            scope,
            user.0.id,
            payload.warehouse_id,
            payload.cedis_warehouse_id,
            &items,
            payload.notes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/replenishment-orders
#[utoipa::path(
    get,
    path = "/api/replenishment-orders",
    tag = "Replenishment Orders",
    params(ReplenishmentQuery),
    responses((status = 200, description = "Pedidos no escopo", body = Vec<ReplenishmentOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_replenishment_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<ReplenishmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .replenishment_service
        .list_orders(&mut *conn, scope.warehouse_id(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/replenishment-orders/{id}
#[utoipa::path(
    get,
    path = "/api/replenishment-orders/{id}",
    tag = "Replenishment Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com detalhes", body = ReplenishmentOrderWithDetails),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_replenishment_order(
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
        .replenishment_service
        .get_order(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/replenishment-orders/{id}/fulfill
#[utoipa::path(
    post,
    path = "/api/replenishment-orders/{id}/fulfill",
    tag = "Replenishment Orders",
    request_body = FulfillPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido enviado (transferência em trânsito)", body = ReplenishmentOrderWithDetails),
        (status = 400, description = "Código fora do pedido ou quantidade excedida"),
        (status = 409, description = "Pedido não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn fulfill_replenishment_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<FulfillPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .replenishment_service
        .fulfill_order(&mut *conn, scope, user.0.id, id, &payload.product_stock_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/replenishment-orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/replenishment-orders/{id}/cancel",
    tag = "Replenishment Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido cancelado", body = ReplenishmentOrder),
        (status = 409, description = "Só pedidos pendentes podem ser cancelados")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_replenishment_order(
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
        .replenishment_service
        .cancel_order(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_items_are_validated() {
        let payload: CreateReplenishmentPayload = serde_json::from_value(serde_json::json!({
            "warehouseId": Uuid::new_v4(),
            "cedisWarehouseId": Uuid::new_v4(),
            "items": [{ "barcode": "750100", "quantity": 0 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_order_is_rejected() {
        let payload: CreateReplenishmentPayload = serde_json::from_value(serde_json::json!({
            "warehouseId": Uuid::new_v4(),
            "cedisWarehouseId": Uuid::new_v4(),
            "items": []
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }
}
