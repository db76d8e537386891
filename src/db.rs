pub mod user_repo;
pub use user_repo::UserRepository;
pub mod warehouse_repo;
pub use warehouse_repo::WarehouseRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod stock_limit_repo;
pub use stock_limit_repo::StockLimitRepository;
pub mod kit_repo;
pub use kit_repo::KitRepository;
pub mod withdraw_order_repo;
pub use withdraw_order_repo::WithdrawOrderRepository;
pub mod transfer_repo;
pub use transfer_repo::TransferRepository;
pub mod shrinkage_repo;
pub use shrinkage_repo::ShrinkageRepository;
pub mod replenishment_repo;
pub use replenishment_repo::ReplenishmentRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
