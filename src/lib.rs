//! IMEI Stock API Library
//!
//! Warehouse inventory backend for refurbished mobile devices: goods-in,
//! quality control and goods-out, with every device tracked by its IMEI.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod services;
pub mod tracing;

use axum::{
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes served under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    let reference_data = Router::new()
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/trays", get(handlers::catalog::list_trays))
        .route("/tac", get(handlers::catalog::lookup_tac))
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/customers/:id", get(handlers::customers::get_customer))
        .route(
            "/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route("/suppliers/:id", get(handlers::suppliers::get_supplier));

    let goods_in = Router::new()
        .route("/goods-in", get(handlers::goods_in::list_goods_in))
        .route("/goods-in/submit", post(handlers::goods_in::submit_goods_in));

    let qc = Router::new()
        .route(
            "/qc/imei",
            get(handlers::qc::list_qc_records).post(handlers::qc::record_qc),
        )
        .route("/qc/purchases", get(handlers::qc::list_qc_purchases))
        .route(
            "/qc/purchases/:id/devices",
            get(handlers::qc::purchase_devices),
        )
        .route(
            "/qc/purchases/:id/update",
            post(handlers::qc::update_purchase_qc),
        );

    let goods_out = Router::new()
        .route("/goods-out", get(handlers::sales_orders::list_goods_out))
        .route(
            "/sales-orders",
            post(handlers::sales_orders::create_sales_order),
        )
        .route(
            "/sales-orders/:id",
            get(handlers::sales_orders::get_sales_order),
        )
        .route(
            "/sales-orders/:id/items/:item_id",
            put(handlers::sales_orders::update_sales_order_item),
        );

    let users = Router::new().route(
        "/user/change-password",
        post(handlers::users::change_password),
    );

    Router::new()
        .merge(reference_data)
        .merge(goods_in)
        .merge(qc)
        .merge(goods_out)
        .merge(users)
}

/// Full application router: health endpoints, the v1 API and Swagger UI,
/// wrapped in request-id and HTTP tracing layers.
///
/// Transport concerns that depend on deployment (CORS, timeouts,
/// compression) are layered on by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/health", get(handlers::health::health_check))
        .route("/status", get(handlers::health::status))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::models::*;
    pub use crate::pagination::*;
    pub use crate::{app_router, AppState};
}
