pub mod catalog;
pub mod common;
pub mod customers;
pub mod goods_in;
pub mod health;
pub mod qc;
pub mod sales_orders;
pub mod suppliers;
pub mod users;

use crate::{
    db::DbPool,
    services::{
        audit::AuditLog, catalog::CatalogService, customers::CustomerService,
        goods_in::GoodsInService, qc::QcService, sales_orders::SalesOrderService,
        suppliers::SupplierService, users::UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub customers: Arc<CustomerService>,
    pub suppliers: Arc<SupplierService>,
    pub goods_in: Arc<GoodsInService>,
    pub qc: Arc<QcService>,
    pub sales_orders: Arc<SalesOrderService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    /// Wires every service to the shared pool.
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let audit = AuditLog::new(db_pool.clone());

        Self {
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone(), audit.clone())),
            suppliers: Arc::new(SupplierService::new(db_pool.clone(), audit.clone())),
            goods_in: Arc::new(GoodsInService::new(db_pool.clone(), audit.clone())),
            qc: Arc::new(QcService::new(db_pool.clone(), audit.clone())),
            sales_orders: Arc::new(SalesOrderService::new(db_pool.clone(), audit.clone())),
            users: Arc::new(UserService::new(db_pool, audit)),
        }
    }
}
