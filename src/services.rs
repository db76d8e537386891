pub mod auth;
pub mod dashboard_service;
pub mod employee_service;
pub mod kit_service;
pub mod product_service;
pub mod replenishment_service;
pub mod shrinkage_service;
pub mod stock_limit_service;
pub mod stock_service;
pub mod transfer_service;
pub mod warehouse_service;
pub mod withdraw_order_service;
