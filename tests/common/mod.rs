#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use imei_stock_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{category, customer, supplier, tac_code, tray, user},
    services::users::hash_password,
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SUPPLIER_ID: &str = "SUP1";
pub const CUSTOMER_ID: &str = "CUST1";

/// Helper harness for spinning up the application against a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with a freshly migrated database.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("imei_stock_test.db").display()
        );

        let mut cfg = AppConfig::new(url, "127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    /// Same as [`TestApp::new`] with categories, TACs, trays, `SUP1` and `CUST1` in place.
    pub async fn seeded() -> Self {
        let app = Self::new().await;
        app.seed_reference_data().await;
        app
    }

    /// Send a JSON request through the full router as operator `tester`.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user", "tester");

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// GET with one extra header, bypassing the default operator header.
    pub async fn router_request_with_header(&self, uri: &str, name: &str, value: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> Response {
        self.request(Method::PUT, uri, Some(body)).await
    }

    /// GET and decode, asserting the status first.
    pub async fn get_json(&self, uri: &str, expected: StatusCode) -> Value {
        let response = self.get(uri).await;
        expect_json(response, expected).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, expected: StatusCode) -> Value {
        let response = self.post(uri, body).await;
        expect_json(response, expected).await
    }

    pub async fn put_json(&self, uri: &str, body: Value, expected: StatusCode) -> Value {
        let response = self.put(uri, body).await;
        expect_json(response, expected).await
    }

    pub async fn seed_reference_data(&self) {
        let db = &*self.state.db;

        for (code, title) in [("APL", "Apple"), ("SAM", "Samsung")] {
            category::ActiveModel {
                code: Set(code.to_string()),
                title: Set(title.to_string()),
            }
            .insert(db)
            .await
            .expect("seed category");
        }

        for (tac, brand, model) in [
            ("35332911", "APL", "iPhone 13"),
            ("35260011", "SAM", "Galaxy S22"),
        ] {
            tac_code::ActiveModel {
                tac: Set(tac.to_string()),
                brand: Set(brand.to_string()),
                model: Set(model.to_string()),
            }
            .insert(db)
            .await
            .expect("seed tac");
        }

        for (id, name) in [("A1", "Shelf A tray 1"), ("B2", "Shelf B tray 2")] {
            tray::ActiveModel {
                id: Set(id.to_string()),
                name: Set(name.to_string()),
                capacity: Set(Some(50)),
            }
            .insert(db)
            .await
            .expect("seed tray");
        }

        supplier::ActiveModel {
            id: Set(SUPPLIER_ID.to_string()),
            name: Set("Northgate Recycling".to_string()),
            contact_name: Set(None),
            email: Set(Some("buying@northgate.example".to_string())),
            phone: Set(None),
            address: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .expect("seed supplier");

        customer::ActiveModel {
            id: Set(CUSTOMER_ID.to_string()),
            name: Set("Handset Outlet Ltd".to_string()),
            contact_name: Set(None),
            email: Set(None),
            phone: Set(None),
            address: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .expect("seed customer");
    }

    /// Inserts a user with an argon2 hash of `password` and returns its id.
    pub async fn seed_user(&self, username: &str, password: &str) -> i32 {
        let now = Utc::now();
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password).expect("hash password")),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
        .id
    }

    /// Receives `imeis` from `SUP1` and returns the new purchase id.
    pub async fn receive(&self, date: &str, imeis: &[&str], qc_required: bool) -> i64 {
        let devices: Vec<Value> = imeis
            .iter()
            .map(|imei| json!({ "imei": imei, "color": "Black", "grade": "B", "storage": "128GB" }))
            .collect();
        let body = self
            .post_json(
                "/api/v1/goods-in/submit",
                json!({
                    "date": date,
                    "supplier_id": SUPPLIER_ID,
                    "qc_required": qc_required,
                    "tray_id": "A1",
                    "devices": devices,
                }),
                StatusCode::CREATED,
            )
            .await;
        body["purchase_id"].as_i64().expect("purchase_id in receipt")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not json")
}

pub async fn expect_json(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body = response_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}
