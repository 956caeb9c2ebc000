//! Entry CRUD, marking and date totals through the HTTP router.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{sample_entry, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_derives_amounts() {
    let app = TestApp::new();

    let entry = app.create(sample_entry("Ramesh", "2024-01-01", "A")).await;

    assert_eq!(entry["entry_date"], "2024-01-01");
    assert_eq!(entry["weight"], "10.00");
    assert_eq!(entry["rate"], "100.00");
    assert_eq!(entry["lessrate"], "10.00");
    assert_eq!(entry["amount"], "45.00");
    assert_eq!(entry["commission"], "0.68");
    assert_eq!(entry["total"], "50.68");
    assert_eq!(entry["is_marked"], false);
    assert_eq!(entry["created_by"], "system");
    assert_eq!(entry["item"], "Wheat");
}

#[tokio::test]
async fn pairs_override_client_weight() {
    let app = TestApp::new();
    let mut body = sample_entry("Ramesh", "2024-01-01", "A");
    body["weight"] = json!(999);

    let entry = app.create(body).await;
    assert_eq!(entry["weight"], "10.00");
}

#[tokio::test]
async fn supplied_weight_used_without_pairs() {
    let app = TestApp::new();
    let mut body = sample_entry("Ramesh", "2024-01-01", "A");
    body["bhartiPairs"] = json!([]);
    body["weight"] = json!("10");

    let entry = app.create(body).await;
    assert_eq!(entry["weight"], "10.00");
    assert_eq!(entry["total"], "50.68");
}

#[tokio::test]
async fn non_numeric_fields_coerce_to_zero() {
    let app = TestApp::new();
    let mut body = sample_entry("Ramesh", "2024-01-01", "A");
    body["rate"] = json!("");
    body["lessRate"] = json!(null);
    body["otherAmount"] = json!("abc");

    let entry = app.create(body).await;
    assert_eq!(entry["amount"], "0.00");
    assert_eq!(entry["other_amount"], 0);
    assert_eq!(entry["total"], "0.00");
}

#[tokio::test]
async fn missing_item_is_recorded_as_na() {
    let app = TestApp::new();
    let mut body = sample_entry("Ramesh", "2024-01-01", "A");
    body.as_object_mut().unwrap().remove("item");

    let entry = app.create(body).await;
    assert_eq!(entry["item"], "N/A");
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let app = TestApp::new();

    let mut no_date = sample_entry("Ramesh", "2024-01-01", "A");
    no_date.as_object_mut().unwrap().remove("entryDate");
    let response = app.post("/api/entries", no_date).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Entry date is required");
    assert_eq!(response.json()["success"], false);

    let blank_name = sample_entry("", "2024-01-01", "A");
    let response = app.post("/api/entries", blank_name).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["error"], "Validation error");

    let long_quality = sample_entry("Ramesh", "2024-01-01", "AB");
    let response = app.post("/api/entries", long_quality).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(app.get("/api/entries").await.json()["data"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn whitespace_name_is_a_validation_error() {
    let app = TestApp::new();

    let response = app
        .post("/api/entries", sample_entry("   ", "2024-01-01", "A"))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["error"], "Validation error");
}

#[tokio::test]
async fn out_of_range_numbers_are_rejected() {
    let app = TestApp::new();

    let mut huge_pair = sample_entry("Ramesh", "2024-01-01", "A");
    huge_pair["bhartiPairs"] = json!([{ "a": "1000000000000000", "b": "1000000000000000" }]);
    let response = app.post("/api/entries", huge_pair).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
    assert_eq!(response.json()["error"], "Bharti pair is out of range");

    let mut huge_rate = sample_entry("Ramesh", "2024-01-01", "A");
    huge_rate["rate"] = json!("1e27");
    let response = app.post("/api/entries", huge_rate).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Rate is out of range");

    // Each factor fits a column but the product does not.
    let mut heavy = sample_entry("Ramesh", "2024-01-01", "A");
    heavy["bhartiPairs"] = json!([{ "a": 99999999, "b": 99999999 }]);
    let response = app.post("/api/entries", heavy).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Weight is out of range");

    let mut many_bags = sample_entry("Ramesh", "2024-01-01", "A");
    many_bags["bags"] = json!("99999999999");
    let response = app.post("/api/entries", many_bags).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Bags is out of range");

    assert!(app.get("/api/entries").await.json()["data"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn actor_header_is_recorded() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/entries")
                .header("content-type", "application/json")
                .header("X-User-ID", "clerk-7")
                .body(Body::from(
                    sample_entry("Ramesh", "2024-01-01", "A").to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let entry = &response.json()["data"];
    assert_eq!(entry["created_by"], "clerk-7");
    assert_eq!(entry["updated_by"], "clerk-7");
}

#[tokio::test]
async fn list_is_newest_first_with_all_amount() {
    let app = TestApp::new();
    let first = app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    let second = app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    let third = app.create_id(sample_entry("B", "2024-01-02", "B")).await;

    let response = app.get("/api/entries").await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.json()["data"].as_array().unwrap().clone();

    let ids: Vec<i64> = data.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![third, second, first]);

    // Lowest id of the (A, 2024-01-01) group carries the group sum.
    assert_eq!(data[2]["all_amount"], "101.36");
    assert_eq!(data[1]["all_amount"], serde_json::Value::Null);
    assert_eq!(data[0]["all_amount"], "50.68");
}

#[tokio::test]
async fn list_filters_by_quality_and_status() {
    let app = TestApp::new();
    let a = app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    app.create_id(sample_entry("B", "2024-01-01", "B")).await;

    app.post("/api/mark-entries", json!({ "entryIds": [a], "marked": true }))
        .await;

    let marked = app.get("/api/entries?status=marked").await.json();
    assert_eq!(marked["data"].as_array().unwrap().len(), 1);
    assert_eq!(marked["data"][0]["id"], a);

    let available = app.get("/api/entries?status=available").await.json();
    assert_eq!(available["data"][0]["name"], "B");

    let quality = app.get("/api/entries?quality=A").await.json();
    assert_eq!(quality["data"].as_array().unwrap().len(), 1);

    // Quality codes match exactly.
    let lowercase = app.get("/api/entries?quality=a").await.json();
    assert!(lowercase["data"].as_array().unwrap().is_empty());

    let all = app.get("/api/entries?quality=all&status=all").await.json();
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_missing_entry_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/api/entries/404").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "Entry not found");
}

#[tokio::test]
async fn update_rederives_and_keeps_creation_audit() {
    let app = TestApp::new();
    let created = app.create(sample_entry("A", "2024-01-01", "A")).await;
    let id = created["id"].as_i64().unwrap();

    let mut edit = sample_entry("A", "2024-01-03", "B");
    edit["rate"] = json!(200);
    let response = app
        .request_json(Method::PUT, &format!("/api/entries/{}", id), edit)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let updated = &response.json()["data"];
    assert_eq!(updated["entry_date"], "2024-01-03");
    assert_eq!(updated["quality"], "B");
    // (200 - 10) × 10 / 20 = 95; commission 1.425 → 1.43.
    assert_eq!(updated["amount"], "95.00");
    assert_eq!(updated["commission"], "1.43");
    assert_eq!(updated["total"], "101.43");
    assert_eq!(updated["created_at"], created["created_at"]);

    let missing = app
        .request_json(
            Method::PUT,
            "/api/entries/999",
            sample_entry("A", "2024-01-01", "A"),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_selected_entries() {
    let app = TestApp::new();
    let a = app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    let b = app.create_id(sample_entry("B", "2024-01-01", "A")).await;

    let response = app
        .request_json(
            Method::DELETE,
            "/api/entries",
            json!({ "entryIds": [a, b.to_string(), 999] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "success": true, "deletedCount": 2 }));

    assert!(app.get("/api/entries").await.json()["data"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let app = TestApp::new();
    app.create_id(sample_entry("A", "2024-01-01", "A")).await;

    let delete = app
        .request_json(Method::DELETE, "/api/entries", json!({ "entryIds": [] }))
        .await;
    assert_eq!(delete.status, StatusCode::BAD_REQUEST);
    assert_eq!(delete.json()["error"], "No entries selected");

    let mark = app.post("/api/mark-entries", json!({ "marked": true })).await;
    assert_eq!(mark.status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.get("/api/entries").await.json()["data"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn mark_then_unmark_restores_entry() {
    let app = TestApp::new();
    let created = app.create(sample_entry("A", "2024-01-01", "A")).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .post("/api/mark-entries", json!({ "entryIds": [id], "marked": true }))
        .await;
    assert_eq!(response.json(), json!({ "success": true }));
    let marked = app.get(&format!("/api/entries/{}", id)).await.json();
    assert_eq!(marked["data"]["is_marked"], true);
    assert_eq!(marked["data"]["updated_at"], created["updated_at"]);

    app.post(
        "/api/mark-entries",
        json!({ "entryIds": [id.to_string()], "marked": false }),
    )
    .await;
    let restored = app.get(&format!("/api/entries/{}", id)).await.json();
    assert_eq!(restored["data"], created);
}

#[tokio::test]
async fn datewise_total_sums_one_day() {
    let app = TestApp::new();
    app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    app.create_id(sample_entry("B", "2024-01-01", "B")).await;
    app.create_id(sample_entry("C", "2024-01-02", "A")).await;

    let response = app
        .post("/api/datewise-total", json!({ "date": "2024-01-01" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let totals = response.json();
    assert_eq!(totals["totalBags"], 4);
    assert_eq!(totals["totalWeight"].as_f64(), Some(20.0));
    assert_eq!(totals["totalAmount"].as_f64(), Some(101.36));
    assert_eq!(totals["totalMarketFee"], 24);

    let empty_day = app
        .post("/api/datewise-total", json!({ "date": "2023-12-31" }))
        .await
        .json();
    assert_eq!(empty_day["totalBags"], 0);

    let missing = app.post("/api/datewise-total", json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["error"], "Date is required");
}

#[tokio::test]
async fn health_and_metrics_endpoints() {
    let app = TestApp::new();

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "ok");

    assert_eq!(app.get("/ready").await.status, StatusCode::OK);

    app.create_id(sample_entry("A", "2024-01-01", "A")).await;
    let metrics = app.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&metrics.body).contains("entry_entries_created_total"));
}
