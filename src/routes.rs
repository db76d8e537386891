// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn create_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/api/users", get(handlers::auth::list_users))
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/users/{id}", put(handlers::auth::update_user));

    let warehouse_routes = Router::new()
        .route(
            "/api/warehouses",
            post(handlers::warehouses::create_warehouse).get(handlers::warehouses::list_warehouses),
        )
        .route(
            "/api/warehouses/{id}",
            get(handlers::warehouses::get_warehouse).put(handlers::warehouses::update_warehouse),
        )
        .route("/api/warehouses/{id}/cabinet", post(handlers::warehouses::create_cabinet))
        .route("/api/cabinets", get(handlers::warehouses::list_cabinets));

    let employee_routes = Router::new()
        .route(
            "/api/employees",
            post(handlers::employees::create_employee).get(handlers::employees::list_employees),
        )
        .route(
            "/api/employees/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::deactivate_employee),
        );

    let product_routes = Router::new()
        .route(
            "/api/products",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route(
            "/api/products/{barcode}",
            get(handlers::products::get_product).put(handlers::products::update_product),
        );

    let stock_routes = Router::new()
        .route(
            "/api/product-stock",
            post(handlers::product_stock::create_stock).get(handlers::product_stock::list_stock),
        )
        .route(
            "/api/product-stock/{id}",
            get(handlers::product_stock::get_stock).delete(handlers::product_stock::delete_stock),
        )
        .route("/api/product-stock/{id}/history", get(handlers::product_stock::get_stock_history))
        .route("/api/product-stock/{id}/empty", post(handlers::product_stock::mark_empty))
        .route("/api/product-stock/{id}/usage", post(handlers::product_stock::record_usage))
        .route(
            "/api/stock-limits",
            post(handlers::stock_limits::create_limit).get(handlers::stock_limits::list_limits),
        )
        .route(
            "/api/stock-limits/{id}",
            put(handlers::stock_limits::update_limit)
                .delete(handlers::stock_limits::delete_limit),
        );

    let assignment_routes = Router::new()
        .route("/api/kits", post(handlers::kits::create_kit).get(handlers::kits::list_kits))
        .route("/api/kits/{id}", get(handlers::kits::get_kit))
        .route("/api/kits/{id}/return", post(handlers::kits::return_kit_units))
        .route(
            "/api/withdraw-orders",
            post(handlers::withdraw_orders::create_withdraw_order)
                .get(handlers::withdraw_orders::list_withdraw_orders),
        )
        .route("/api/withdraw-orders/{id}", get(handlers::withdraw_orders::get_withdraw_order))
        .route("/api/withdraw-orders/{id}/items", post(handlers::withdraw_orders::add_withdraw_items))
        .route("/api/withdraw-orders/{id}/return", post(handlers::withdraw_orders::return_withdraw_units));

    let transfer_routes = Router::new()
        .route(
            "/api/transfers",
            post(handlers::transfers::create_transfer).get(handlers::transfers::list_transfers),
        )
        .route("/api/transfers/{id}", get(handlers::transfers::get_transfer))
        .route("/api/transfers/{id}/ship", post(handlers::transfers::ship_transfer))
        .route("/api/transfers/{id}/receive", post(handlers::transfers::receive_transfer_units))
        .route("/api/transfers/{id}/complete", post(handlers::transfers::complete_transfer))
        .route("/api/transfers/{id}/cancel", post(handlers::transfers::cancel_transfer))
        .route(
            "/api/replenishment-orders",
            post(handlers::replenishment::create_replenishment_order)
                .get(handlers::replenishment::list_replenishment_orders),
        )
        .route(
            "/api/replenishment-orders/{id}",
            get(handlers::replenishment::get_replenishment_order),
        )
        .route(
            "/api/replenishment-orders/{id}/fulfill",
            post(handlers::replenishment::fulfill_replenishment_order),
        )
        .route(
            "/api/replenishment-orders/{id}/cancel",
            post(handlers::replenishment::cancel_replenishment_order),
        );

    let report_routes = Router::new()
        .route(
            "/api/merma",
            get(handlers::merma::list_shrinkage).post(handlers::merma::record_shrinkage),
        )
        .route("/api/merma/summary", get(handlers::merma::shrinkage_summary))
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .route("/api/dashboard/low-stock", get(handlers::dashboard::get_low_stock))
        .route(
            "/api/dashboard/unfulfilled-orders",
            get(handlers::dashboard::get_unfulfilled_orders),
        );

    // Tudo abaixo exige Bearer válido
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(warehouse_routes)
        .merge(employee_routes)
        .merge(product_routes)
        .merge(stock_routes)
        .merge(assignment_routes)
        .merge(transfer_routes)
        .merge(report_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/product-stock").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn error_follows_accept_language() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard/summary")
                    .header(header::ACCEPT_LANGUAGE, "es-MX")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "El token de autenticación es inválido o no existe.");
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_database() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"nao-e-email","password":"12345678","name":"Ana"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["details"]["email"].is_array());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["paths"]["/api/transfers/{id}/complete"].is_object());
    }
}
