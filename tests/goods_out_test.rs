mod common;

use axum::http::StatusCode;
use common::{TestApp, CUSTOMER_ID};
use imei_stock_api::entities::device::{self, StockStatus};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};

async fn create_three_line_order(app: &TestApp) -> Value {
    app.post_json(
        "/api/v1/sales-orders",
        json!({
            "customer_id": CUSTOMER_ID,
            "customer_ref": "HO-778",
            "date": "2024-02-01",
            "lines": [
                { "brand": "APL", "details": "iPhone 13", "color": "Black", "grade": "B", "storage": "128GB", "quantity": 1 },
                { "brand": "apl", "details": "iPhone 13 ", "color": "black", "grade": 2, "storage": "128GB", "quantity": 1 },
                { "brand": "APL", "details": "iPhone 13", "color": "Black", "grade": "B", "storage": "256GB", "quantity": 1 }
            ]
        }),
        StatusCode::CREATED,
    )
    .await
}

async fn device_status(app: &TestApp, imei: &str) -> StockStatus {
    device::Entity::find()
        .filter(device::Column::Imei.eq(imei))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn identical_lines_are_grouped_with_quantities() {
    let app = TestApp::seeded().await;
    let order = create_three_line_order(&app).await;

    assert_eq!(order["total_quantity"], 3);
    assert_eq!(order["completed_quantity"], 0);
    assert_eq!(order["customer_name"], "Handset Outlet Ltd");
    assert_eq!(order["date"], "2024-02-01");

    let lines = order["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["storage"], "128GB");
    assert_eq!(lines[0]["brand_title"], "Apple");
    assert_eq!(lines[0]["item_ids"].as_array().unwrap().len(), 2);
    assert_eq!(lines[1]["quantity"], 1);
    assert_eq!(lines[1]["storage"], "256GB");

    let order_id = order["order_id"].as_i64().unwrap();
    let fetched = app
        .get_json(&format!("/api/v1/sales-orders/{order_id}"), StatusCode::OK)
        .await;
    assert_eq!(fetched["lines"], order["lines"]);
}

#[tokio::test]
async fn completing_an_item_takes_the_device_out_of_stock() {
    let app = TestApp::seeded().await;
    app.receive("2024-01-01", &["353329110003001"], false).await;
    let order = create_three_line_order(&app).await;
    let order_id = order["order_id"].as_i64().unwrap();
    let item_id = order["lines"][0]["item_ids"][0].as_i64().unwrap();

    let item = app
        .put_json(
            &format!("/api/v1/sales-orders/{order_id}/items/{item_id}"),
            json!({ "imei": "353329110003001", "isCompleted": true }),
            StatusCode::OK,
        )
        .await;
    assert_eq!(item["is_completed"], true);
    assert_eq!(item["imei"], "353329110003001");
    assert_eq!(device_status(&app, "353329110003001").await, StockStatus::Out);

    let listing = app.get_json("/api/v1/goods-out", StatusCode::OK).await;
    let orders = listing["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["item_count"], 3);
    assert_eq!(orders[0]["completed_count"], 1);
    assert_eq!(orders[0]["is_completed"], false);

    // reopening returns the device to stock
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{item_id}"),
        json!({ "is_completed": false }),
        StatusCode::OK,
    )
    .await;
    assert_eq!(device_status(&app, "353329110003001").await, StockStatus::In);
}

#[tokio::test]
async fn a_shipped_device_cannot_be_allocated_twice() {
    let app = TestApp::seeded().await;
    app.receive("2024-01-01", &["353329110003101"], false).await;
    let order = create_three_line_order(&app).await;
    let order_id = order["order_id"].as_i64().unwrap();
    let first = order["lines"][0]["item_ids"][0].as_i64().unwrap();
    let second = order["lines"][0]["item_ids"][1].as_i64().unwrap();

    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{first}"),
        json!({ "imei": "353329110003101", "is_completed": true }),
        StatusCode::OK,
    )
    .await;
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{second}"),
        json!({ "imei": "353329110003101", "is_completed": true }),
        StatusCode::CONFLICT,
    )
    .await;

    // re-saving the same allocation is fine
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{first}"),
        json!({ "imei": "353329110003101", "is_completed": true }),
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
async fn completing_without_a_device_is_rejected() {
    let app = TestApp::seeded().await;
    let order = create_three_line_order(&app).await;
    let order_id = order["order_id"].as_i64().unwrap();
    let item_id = order["lines"][1]["item_ids"][0].as_i64().unwrap();

    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{item_id}"),
        json!({ "is_completed": true }),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{item_id}"),
        json!({ "imei": "000000000000000", "is_completed": true }),
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn unknown_orders_and_customers_are_not_found() {
    let app = TestApp::seeded().await;
    app.get_json("/api/v1/sales-orders/999", StatusCode::NOT_FOUND)
        .await;
    app.put_json(
        "/api/v1/sales-orders/999/items/1",
        json!({ "is_completed": false }),
        StatusCode::NOT_FOUND,
    )
    .await;
    app.post_json(
        "/api/v1/sales-orders",
        json!({ "customer_id": "NOBODY", "lines": [{ "brand": "APL", "quantity": 1 }] }),
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn goods_out_filters_by_customer_and_date() {
    let app = TestApp::seeded().await;
    let order = create_three_line_order(&app).await;
    let order_id = order["order_id"].as_i64().unwrap();

    let hit = app
        .get_json(
            &format!("/api/v1/goods-out?customerId={CUSTOMER_ID}&dateFrom=2024-02-01&dateTo=2024-02-01"),
            StatusCode::OK,
        )
        .await;
    let orders = hit["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"].as_i64(), Some(order_id));
    assert_eq!(orders[0]["date"], "2024-02-01");

    let miss = app
        .get_json("/api/v1/goods-out?dateFrom=2024-03-01", StatusCode::OK)
        .await;
    assert!(miss["orders"].as_array().unwrap().is_empty());
    assert_eq!(miss["pagination"]["totalCount"], 0);
}

#[tokio::test]
async fn one_device_cannot_be_shipped_on_two_lines() {
    let app = TestApp::seeded().await;
    app.receive("2024-01-01", &["353329110003001"], false).await;
    let order = create_three_line_order(&app).await;
    let order_id = order["order_id"].as_i64().unwrap();
    let first = order["lines"][0]["item_ids"][0].as_i64().unwrap();
    let second = order["lines"][0]["item_ids"][1].as_i64().unwrap();

    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{first}"),
        json!({ "imei": "353329110003001", "is_completed": false }),
        StatusCode::OK,
    )
    .await;
    // an open line already holds the device
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{second}"),
        json!({ "imei": "353329110003001", "is_completed": false }),
        StatusCode::CONFLICT,
    )
    .await;

    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{first}"),
        json!({ "is_completed": true }),
        StatusCode::OK,
    )
    .await;
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{second}"),
        json!({ "imei": "353329110003001", "is_completed": true }),
        StatusCode::CONFLICT,
    )
    .await;
    app.put_json(
        &format!("/api/v1/sales-orders/{order_id}/items/{second}"),
        json!({ "is_completed": true }),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let detail = app
        .get_json(&format!("/api/v1/sales-orders/{order_id}"), StatusCode::OK)
        .await;
    assert_eq!(detail["completed_quantity"], 1);
    assert_eq!(detail["lines"][0]["imeis"], json!(["353329110003001"]));
    assert_eq!(device_status(&app, "353329110003001").await, StockStatus::Out);
}

#[tokio::test]
async fn brand_titles_resolve_regardless_of_case() {
    let app = TestApp::seeded().await;
    let order = app
        .post_json(
            "/api/v1/sales-orders",
            json!({
                "customer_id": CUSTOMER_ID,
                "lines": [
                    { "brand": "apl", "details": "iPhone 13", "quantity": 1 },
                    { "brand": "APL", "details": "iPhone 13", "quantity": 1 },
                    { "brand": "xyz", "details": "Unknown", "quantity": 1 }
                ]
            }),
            StatusCode::CREATED,
        )
        .await;

    let lines = order["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["brand"], "apl");
    assert_eq!(lines[0]["brand_title"], "Apple");
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[1]["brand_title"], "xyz");
}

#[tokio::test]
async fn malformed_path_ids_are_json_bad_requests() {
    let app = TestApp::seeded().await;
    for uri in [
        "/api/v1/sales-orders/abc",
        "/api/v1/qc/purchases/abc/devices",
    ] {
        let body = app.get_json(uri, StatusCode::BAD_REQUEST).await;
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
    }
    let body = app
        .put_json(
            "/api/v1/sales-orders/1/items/first",
            json!({ "is_completed": false }),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["error"].is_string());
}
