pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod kits;
pub mod merma;
pub mod product_stock;
pub mod products;
pub mod replenishment;
pub mod stock_limits;
pub mod transfers;
pub mod warehouses;
pub mod withdraw_orders;
