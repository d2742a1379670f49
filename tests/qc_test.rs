mod common;

use axum::http::StatusCode;
use common::TestApp;
use imei_stock_api::entities::{device, purchase_line, qc_record};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

const BATCH: [&str; 3] = ["353329110001001", "353329110001002", "353329110001003"];

#[tokio::test]
async fn completing_qc_on_one_device_completes_the_whole_order() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH, true).await;

    let result = app
        .post_json(
            &format!("/api/v1/qc/purchases/{purchase_id}/update"),
            json!({
                "devices": [{
                    "imei": BATCH[0],
                    "cosmetic": true,
                    "functional": true,
                    "grade": "A",
                    "color": "Graphite"
                }],
                "qcCompleted": true
            }),
            StatusCode::OK,
        )
        .await;
    assert_eq!(result["updated"], 1);
    assert_eq!(result["qc_completed"], true);

    let db = &*app.state.db;
    let lines = purchase_line::Entity::find()
        .filter(purchase_line::Column::PurchaseId.eq(purchase_id as i32))
        .all(db)
        .await
        .unwrap();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.qc_completed));

    let updated = device::Entity::find()
        .filter(device::Column::Imei.eq(BATCH[0]))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.grade, 1);
    assert_eq!(updated.color.as_deref(), Some("Graphite"));
}

#[tokio::test]
async fn batch_without_completion_flag_leaves_lines_open() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH, true).await;

    let result = app
        .post_json(
            &format!("/api/v1/qc/purchases/{purchase_id}/update"),
            json!({
                "devices": [{ "imei": BATCH[1], "cosmetic": false, "functional": true }]
            }),
            StatusCode::OK,
        )
        .await;
    assert_eq!(result["qc_completed"], false);

    let pending = app
        .get_json("/api/v1/qc/purchases?qcStatus=pending", StatusCode::OK)
        .await;
    assert_eq!(pending["purchases"].as_array().unwrap().len(), 1);
    let completed = app
        .get_json("/api/v1/qc/purchases?qcStatus=completed", StatusCode::OK)
        .await;
    assert!(completed["purchases"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recording_the_same_device_twice_keeps_one_record() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH, true).await;

    let first = app
        .post_json(
            "/api/v1/qc/imei",
            json!({
                "purchase_id": purchase_id,
                "imei": BATCH[2],
                "cosmetic": false,
                "functional": true,
                "comments": "scratched bezel"
            }),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(first["passed"], false);

    let second = app
        .post_json(
            "/api/v1/qc/imei",
            json!({
                "purchase_id": purchase_id,
                "device_code": BATCH[2],
                "cosmetic": true,
                "functional": true
            }),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["passed"], true);

    let count = qc_record::Entity::find()
        .filter(qc_record::Column::DeviceCode.eq(BATCH[2]))
        .filter(qc_record::Column::PurchaseId.eq(purchase_id as i32))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // a single result completes the order
    let lines = purchase_line::Entity::find()
        .filter(purchase_line::Column::PurchaseId.eq(purchase_id as i32))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(lines.iter().all(|l| l.qc_completed));
}

#[tokio::test]
async fn qc_records_filter_by_result_and_search() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH, true).await;
    app.post_json(
        &format!("/api/v1/qc/purchases/{purchase_id}/update"),
        json!({
            "devices": [
                { "imei": BATCH[0], "cosmetic": true, "functional": true },
                { "imei": BATCH[1], "cosmetic": true, "functional": false }
            ]
        }),
        StatusCode::OK,
    )
    .await;

    let failed = app
        .get_json("/api/v1/qc/imei?status=failed", StatusCode::OK)
        .await;
    let records = failed["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["device_code"], BATCH[1]);

    let passed = app
        .get_json("/api/v1/qc/imei?status=passed&search=1001", StatusCode::OK)
        .await;
    assert_eq!(passed["records"].as_array().unwrap().len(), 1);
    assert_eq!(passed["pagination"]["totalCount"], 1);

    app.get_json("/api/v1/qc/imei?status=maybe", StatusCode::BAD_REQUEST)
        .await;
}

#[tokio::test]
async fn purchase_devices_joins_catalog_and_qc_results() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH[..2], true).await;
    app.post_json(
        "/api/v1/qc/imei",
        json!({
            "purchase_id": purchase_id,
            "imei": BATCH[0],
            "cosmetic": true,
            "functional": true
        }),
        StatusCode::CREATED,
    )
    .await;

    let view = app
        .get_json(
            &format!("/api/v1/qc/purchases/{purchase_id}/devices"),
            StatusCode::OK,
        )
        .await;
    assert_eq!(view["purchase"]["purchase_id"].as_i64(), Some(purchase_id));
    assert_eq!(view["purchase"]["device_count"], 2);

    let devices = view["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["imei"], BATCH[0]);
    assert_eq!(devices[0]["brand"], "APL");
    assert_eq!(devices[0]["brand_title"], "Apple");
    assert_eq!(devices[0]["model"], "iPhone 13");
    assert_eq!(devices[0]["grade"], "B");
    assert_eq!(devices[0]["qc"]["passed"], true);
    assert!(devices[1]["qc"].is_null());
}

#[tokio::test]
async fn qc_update_rejects_devices_outside_the_order() {
    let app = TestApp::seeded().await;
    let purchase_id = app.receive("2024-01-01", &BATCH[..1], true).await;

    app.post_json(
        &format!("/api/v1/qc/purchases/{purchase_id}/update"),
        json!({
            "devices": [{ "imei": "999999990000000", "cosmetic": true, "functional": true }],
            "qcCompleted": true
        }),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let lines = purchase_line::Entity::find()
        .filter(purchase_line::Column::PurchaseId.eq(purchase_id as i32))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(lines.iter().all(|l| !l.qc_completed));
}

#[tokio::test]
async fn qc_against_unknown_purchase_is_not_found() {
    let app = TestApp::seeded().await;
    app.post_json(
        "/api/v1/qc/imei",
        json!({ "purchase_id": 4242, "imei": BATCH[0], "cosmetic": true, "functional": true }),
        StatusCode::NOT_FOUND,
    )
    .await;
    app.get_json("/api/v1/qc/purchases/4242/devices", StatusCode::NOT_FOUND)
        .await;
    app.get_json("/api/v1/qc/purchases?qcStatus=done", StatusCode::BAD_REQUEST)
        .await;
}

#[tokio::test]
async fn qc_queue_only_lists_orders_needing_qc() {
    let app = TestApp::seeded().await;
    app.receive("2024-01-01", &["353329110002001"], false).await;
    let needs_qc = app.receive("2024-01-02", &["353329110002002"], true).await;

    let queue = app.get_json("/api/v1/qc/purchases", StatusCode::OK).await;
    let purchases = queue["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0]["purchase_id"].as_i64(), Some(needs_qc));
}
