//! Purchase history integration tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, TestHarness};
use serde_json::{json, Value};

fn dates(detail: &Value) -> Vec<String> {
    detail["purchases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap().to_string())
        .collect()
}

fn purchase_id(detail: &Value, date: &str) -> String {
    detail["purchases"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["date"] == date)
        .and_then(|p| p["id"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn purchases_are_kept_in_date_order() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;

    harness.add_purchase(&token, &id, "2024-01-20", 15).await;
    let detail = harness.add_purchase(&token, &id, "2024-01-05", 10).await;

    assert_eq!(dates(&detail), vec!["2024-01-05", "2024-01-20"]);
    assert_eq!(detail["can_predict"], true);
}

#[tokio::test]
async fn chart_series_follows_purchase_order() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;

    harness.add_purchase(&token, &id, "2024-01-20", 15).await;
    let detail = harness.add_purchase(&token, &id, "2024-01-05", 10).await;

    assert_eq!(
        detail["chart"],
        json!([
            {"date": "05/01/2024", "quantity": 10},
            {"date": "20/01/2024", "quantity": 15}
        ])
    );
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;

    let response = harness
        .server
        .post(&format!("/v1/customers/{id}/purchases"))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"date": "2024-01-05", "quantity": 0}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_failed");
}

#[tokio::test]
async fn edit_moves_purchase_and_resorts() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;
    harness.add_purchase(&token, &id, "2024-01-05", 10).await;
    let detail = harness.add_purchase(&token, &id, "2024-01-20", 15).await;
    let pid = purchase_id(&detail, "2024-01-05");

    let response = harness
        .server
        .patch(&format!("/v1/customers/{id}/purchases/{pid}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"date": "2024-02-01", "quantity": 12}))
        .await;

    response.assert_status_ok();
    let detail: Value = response.json();
    assert_eq!(dates(&detail), vec!["2024-01-20", "2024-02-01"]);
    assert_eq!(detail["purchases"][1]["id"], pid.as_str());
    assert_eq!(detail["purchases"][1]["quantity"], 12);
}

#[tokio::test]
async fn empty_edit_is_rejected() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;
    let detail = harness.add_purchase(&token, &id, "2024-01-05", 10).await;
    let pid = purchase_id(&detail, "2024-01-05");

    harness
        .server
        .patch(&format!("/v1/customers/{id}/purchases/{pid}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_removes_only_that_purchase() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;
    harness.add_purchase(&token, &id, "2024-01-05", 10).await;
    let detail = harness.add_purchase(&token, &id, "2024-01-20", 15).await;
    let pid = purchase_id(&detail, "2024-01-05");

    let response = harness
        .server
        .delete(&format!("/v1/customers/{id}/purchases/{pid}"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let detail: Value = response.json();
    assert_eq!(dates(&detail), vec!["2024-01-20"]);
    assert_eq!(detail["can_predict"], false);
}

#[tokio::test]
async fn unknown_purchase_is_not_found() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;
    harness.add_purchase(&token, &id, "2024-01-05", 10).await;

    harness
        .server
        .delete(&format!(
            "/v1/customers/{id}/purchases/6f1c2b1e-3d4a-4c5b-9e8f-0a1b2c3d4e5f"
        ))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_purchase_id_is_bad_request() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;

    harness
        .server
        .delete(&format!("/v1/customers/{id}/purchases/not-a-uuid"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn write_from_stale_session_is_a_conflict() {
    let harness = TestHarness::new().await;
    let phone = harness.sign_in("u1").await;
    let id = harness.create_customer(&phone, "Chị Hoa").await;
    let laptop = harness.sign_in("u1").await;

    harness.add_purchase(&phone, &id, "2024-01-05", 10).await;

    // The laptop has not seen the phone's purchase yet.
    let response = harness
        .server
        .post(&format!("/v1/customers/{id}/purchases"))
        .add_header(AUTHORIZATION, bearer(&laptop))
        .json(&json!({ "date": "2024-01-20", "quantity": 15 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");

    let customer_id = id.parse::<chili_core::CustomerId>().unwrap();
    let stored = harness.store.get(&customer_id).unwrap();
    assert_eq!(stored.purchases.len(), 1);

    // The conflict refreshed the laptop, so a retry keeps both purchases.
    let detail = harness.add_purchase(&laptop, &id, "2024-01-20", 15).await;
    assert_eq!(dates(&detail), vec!["2024-01-05", "2024-01-20"]);
    assert_eq!(harness.store.get(&customer_id).unwrap().purchases.len(), 2);
}
