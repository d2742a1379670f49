mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn categories_are_listed_by_title_and_searchable() {
    let app = TestApp::seeded().await;

    let all = app.get_json("/api/v1/categories", StatusCode::OK).await;
    let titles: Vec<&str> = all["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Apple", "Samsung"]);

    let filtered = app
        .get_json("/api/v1/categories?search=SAMS", StatusCode::OK)
        .await;
    let categories = filtered["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["code"], "SAM");
}

#[tokio::test]
async fn trays_are_listed_by_id() {
    let app = TestApp::seeded().await;
    let body = app.get_json("/api/v1/trays", StatusCode::OK).await;
    let ids: Vec<&str> = body["trays"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["A1", "B2"]);

    let filtered = app
        .get_json("/api/v1/trays?search=shelf%20b", StatusCode::OK)
        .await;
    assert_eq!(filtered["trays"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tac_lookup_resolves_brand_and_model() {
    let app = TestApp::seeded().await;

    let hit = app
        .get_json("/api/v1/tac?imei=353329110099999", StatusCode::OK)
        .await;
    assert_eq!(hit["tac"], "35332911");
    assert_eq!(hit["brand"], "APL");
    assert_eq!(hit["brand_title"], "Apple");
    assert_eq!(hit["model"], "iPhone 13");

    app.get_json("/api/v1/tac?imei=111111110000000", StatusCode::NOT_FOUND)
        .await;
    app.get_json("/api/v1/tac?imei=12ab", StatusCode::BAD_REQUEST)
        .await;
}

#[tokio::test]
async fn customers_can_be_created_fetched_and_searched() {
    let app = TestApp::seeded().await;

    let created = app
        .post_json(
            "/api/v1/customers",
            json!({ "id": "CUST2", "name": "Mobile Depot", "email": "sales@depot.example" }),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(created["id"], "CUST2");

    let fetched = app
        .get_json("/api/v1/customers/CUST2", StatusCode::OK)
        .await;
    assert_eq!(fetched["name"], "Mobile Depot");

    let search = app
        .get_json("/api/v1/customers?search=depot", StatusCode::OK)
        .await;
    assert_eq!(search["customers"].as_array().unwrap().len(), 1);

    let all = app
        .get_json("/api/v1/customers?limit=1", StatusCode::OK)
        .await;
    assert_eq!(all["customers"].as_array().unwrap().len(), 1);
    assert_eq!(all["pagination"]["totalCount"], 2);
    assert_eq!(all["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn duplicate_or_missing_customers_are_reported() {
    let app = TestApp::seeded().await;
    app.post_json(
        "/api/v1/customers",
        json!({ "id": "CUST1", "name": "Again" }),
        StatusCode::CONFLICT,
    )
    .await;
    app.post_json(
        "/api/v1/customers",
        json!({ "id": "CUST9", "name": "Bad Mail", "email": "not-an-email" }),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.get_json("/api/v1/customers/NOPE", StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn suppliers_mirror_customer_behaviour() {
    let app = TestApp::seeded().await;
    app.post_json(
        "/api/v1/suppliers",
        json!({ "id": "SUP2", "name": "Eastside Trade-ins" }),
        StatusCode::CREATED,
    )
    .await;
    app.post_json(
        "/api/v1/suppliers",
        json!({ "id": "SUP2", "name": "Eastside Trade-ins" }),
        StatusCode::CONFLICT,
    )
    .await;

    let listing = app.get_json("/api/v1/suppliers", StatusCode::OK).await;
    let names: Vec<&str> = listing["suppliers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Eastside Trade-ins", "Northgate Recycling"]);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::seeded().await;
    let response = app
        .post("/api/v1/customers", json!({ "name": "missing id" }))
        .await;
    let body = common::expect_json(response, StatusCode::BAD_REQUEST).await;
    assert!(body["error"].as_str().unwrap().len() > 0);
}
