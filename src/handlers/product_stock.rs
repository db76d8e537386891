// src/handlers/product_stock.rs

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
    db::stock_repo::StockFilter,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Encargado, RequireRole},
        scope::WarehouseScope,
    },
    models::{
        product_stock::{ProductStockView, StockMovement, StockState},
        shrinkage::ShrinkageReason,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockPayload {
    #[validate(length(min = 1, message = "required"))]
    pub barcode: String,
    pub warehouse_id: Uuid,

    #[validate(range(min = 1, max = 500, message = "quantity_range"))]
    #[schema(example = 10)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordUsagePayload {
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStockPayload {
    pub reason: ShrinkageReason,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub warehouse_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub state: Option<StockState>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl StockQuery {
    fn into_filter(self, warehouse_id: Option<Uuid>) -> StockFilter {
        StockFilter {
            warehouse_id,
            barcode: self.barcode.filter(|b| !b.trim().is_empty()),
            state: self.state,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

// POST /api/product-stock
#[utoipa::path(
    post,
    path = "/api/product-stock",
    tag = "Product Stock",
    request_body = CreateStockPayload,
    responses(
        (status = 201, description = "Unidades criadas (disponíveis)", body = Vec<ProductStockView>),
        (status = 400, description = "Quantidade fora do intervalo ou almacén inativo"),
        (status = 404, description = "Produto ou almacén inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Json(payload): Json<CreateStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let units = app_state
        .stock_service
        .create_units(&mut *conn, scope, payload.barcode.trim(), payload.warehouse_id, payload.quantity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let views: Vec<ProductStockView> = units.into_iter().map(ProductStockView::from).collect();
    Ok((StatusCode::CREATED, Json(views)))
}

// GET /api/product-stock
#[utoipa::path(
    get,
    path = "/api/product-stock",
    tag = "Product Stock",
    params(StockQuery),
    responses((status = 200, description = "Unidades no escopo", body = Vec<ProductStockView>)),
    security(("api_jwt" = []))
)]
pub async fn list_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Query(query): Query<StockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope
        .narrow(query.warehouse_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let filter = query.into_filter(scope.warehouse_id());

    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let units = app_state
        .stock_service
        .list_units(&mut *conn, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let views: Vec<ProductStockView> = units.into_iter().map(ProductStockView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

// GET /api/product-stock/{id}
#[utoipa::path(
    get,
    path = "/api/product-stock/{id}",
    tag = "Product Stock",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade com estado derivado", body = ProductStockView),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .stock_service
        .get_unit(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ProductStockView::from(unit))))
}

// GET /api/product-stock/{id}/history
#[utoipa::path(
    get,
    path = "/api/product-stock/{id}/history",
    tag = "Product Stock",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses((status = 200, description = "Movimentos, do mais novo ao mais antigo", body = Vec<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn get_stock_history(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let movements = app_state
        .stock_service
        .get_history(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

// POST /api/product-stock/{id}/empty
#[utoipa::path(
    post,
    path = "/api/product-stock/{id}/empty",
    tag = "Product Stock",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade vazia", body = ProductStockView),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_empty(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .stock_service
        .mark_empty(&mut *conn, scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ProductStockView::from(unit))))
}

// POST /api/product-stock/{id}/usage
#[utoipa::path(
    post,
    path = "/api/product-stock/{id}/usage",
    tag = "Product Stock",
    request_body = RecordUsagePayload,
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Uso registrado (vazia ao atingir maxUses)", body = ProductStockView),
        (status = 409, description = "Unidade não disponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_usage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordUsagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .stock_service
        .record_usage(&mut *conn, scope, id, payload.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ProductStockView::from(unit))))
}

// DELETE /api/product-stock/{id}
#[utoipa::path(
    delete,
    path = "/api/product-stock/{id}",
    tag = "Product Stock",
    request_body = DeleteStockPayload,
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade baixada; merma registrada", body = ProductStockView),
        (status = 403, description = "Apenas ENCARGADO ou ADMIN"),
        (status = 409, description = "Unidade em uso, em kit ou em transferência")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<Encargado>,
    scope: WarehouseScope,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeleteStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_audited_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .stock_service
        .delete_unit(&mut *conn, scope, user.0.id, id, payload.reason, payload.notes.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ProductStockView::from(unit))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<i64>, offset: Option<i64>) -> StockQuery {
        StockQuery {
            warehouse_id: None,
            barcode: Some("  ".into()),
            state: Some(StockState::InKit),
            limit,
            offset,
        }
    }

    #[test]
    fn paging_is_clamped() {
        let filter = query(None, None).into_filter(None);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.barcode, None);
        assert_eq!(filter.state, Some(StockState::InKit));

        let filter = query(Some(10_000), Some(-5)).into_filter(None);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn quantity_outside_range_fails() {
        let payload = CreateStockPayload {
            barcode: "750100".into(),
            warehouse_id: Uuid::new_v4(),
            quantity: 501,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        let quantity = &fields["quantity"][0];
        assert_eq!(quantity.message.as_deref(), Some("quantity_range"));
    }

    #[test]
    fn state_filter_uses_snake_case() {
        let state: StockState = serde_json::from_str("\"in_use\"").unwrap();
        assert_eq!(state, StockState::InUse);
    }
}
