mod common;

use axum::http::StatusCode;
use common::TestApp;
use imei_stock_api::{
    entities::{log_entry, user},
    services::users::verify_password,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;
    let body = app.get_json("/health", StatusCode::OK).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["checks"]["database"]["status"], "up");

    let status = app.get_json("/status", StatusCode::OK).await;
    assert_eq!(status["name"], "imei-stock-api");
    assert_eq!(status["environment"], "test");
}

#[tokio::test]
async fn responses_carry_the_caller_request_id() {
    let app = TestApp::new().await;
    let response = app
        .router_request_with_header("/api/v1/customers/NOPE", "x-request-id", "trace-77")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-77"
    );
    let body = common::response_json(response).await;
    assert_eq!(body["request_id"], "trace-77");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let doc = app.get_json("/api-docs/openapi.json", StatusCode::OK).await;
    assert!(doc["paths"]["/api/v1/goods-in/submit"].is_object());
}

#[tokio::test]
async fn change_password_verifies_the_current_password() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("alex", "original-pass").await;

    app.post_json(
        "/api/v1/user/change-password",
        json!({ "userId": user_id, "currentPassword": "wrong-pass", "newPassword": "brand-new-pass" }),
        StatusCode::UNAUTHORIZED,
    )
    .await;
    app.post_json(
        "/api/v1/user/change-password",
        json!({ "userId": user_id, "currentPassword": "original-pass", "newPassword": "short" }),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.post_json(
        "/api/v1/user/change-password",
        json!({ "userId": 9999, "currentPassword": "original-pass", "newPassword": "brand-new-pass" }),
        StatusCode::NOT_FOUND,
    )
    .await;

    let body = app
        .post_json(
            "/api/v1/user/change-password",
            json!({ "userId": user_id, "currentPassword": "original-pass", "newPassword": "brand-new-pass" }),
            StatusCode::OK,
        )
        .await;
    assert!(body["message"].is_string());

    let stored = user::Entity::find_by_id(user_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("brand-new-pass", &stored.password_hash).unwrap());
    assert!(!verify_password("original-pass", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn writes_are_attributed_to_the_operator_in_the_log() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &["353329110004001"], false).await;

    let entries = log_entry::Entity::find()
        .filter(log_entry::Column::Subject.eq("goods-in"))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, "tester");
    assert_eq!(entries[0].ref_id, Some(purchase_id.to_string()));
}
