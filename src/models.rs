pub mod auth;
pub mod warehouse;
pub mod employee;
pub mod product;
pub mod product_stock;
pub mod assignment;
pub mod kit;
pub mod withdraw_order;
pub mod transfer;
pub mod shrinkage;
pub mod replenishment;
pub mod stock_limit;
pub mod dashboard;
