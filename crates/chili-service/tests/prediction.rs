//! Forecast integration tests.

mod common;

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, gemini_reply, TestHarness, FORECAST_PATH};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use chili_core::{CustomerId, CustomerUpdate, UserId};
use chili_store::{AuthContext, Store};

const FORECAST_JSON: &str = r#"{"nextPurchaseDate":"2024-02-04","expectedQuantity":17,"reasoning":"Mua khoảng 15 ngày một lần, số lượng tăng dần."}"#;

async fn customer_with_history(harness: &TestHarness, token: &str) -> String {
    let id = harness.create_customer(token, "Chị Hoa").await;
    harness.add_purchase(token, &id, "2024-01-05", 10).await;
    harness.add_purchase(token, &id, "2024-01-20", 15).await;
    id
}

async fn predict(harness: &TestHarness, token: &str, id: &str) -> axum_test::TestResponse {
    harness
        .server
        .post(&format!("/v1/customers/{id}/prediction"))
        .add_header(AUTHORIZATION, bearer(token))
        .await
}

#[tokio::test]
async fn forecast_is_stored_verbatim() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(gemini_reply(FORECAST_JSON))
        .expect(1)
        .mount(&harness.mock)
        .await;

    let response = predict(&harness, &token, &id).await;

    response.assert_status_ok();
    let detail: Value = response.json();
    assert_eq!(detail["prediction"]["next_purchase_date"], "2024-02-04");
    assert_eq!(detail["prediction"]["expected_quantity"], 17.0);
    assert_eq!(
        detail["prediction"]["reasoning"],
        "Mua khoảng 15 ngày một lần, số lượng tăng dần."
    );
    assert_eq!(detail["predicting"], false);

    let stored = harness
        .store
        .get(&CustomerId::new(id).unwrap())
        .unwrap();
    assert_eq!(
        stored.prediction.unwrap().next_purchase_date.to_string(),
        "2024-02-04"
    );
}

#[tokio::test]
async fn changing_history_clears_forecast() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(gemini_reply(FORECAST_JSON))
        .mount(&harness.mock)
        .await;
    predict(&harness, &token, &id).await.assert_status_ok();

    let detail = harness.add_purchase(&token, &id, "2024-02-03", 16).await;

    assert!(detail["prediction"].is_null());
}

#[tokio::test]
async fn too_little_history_skips_the_model() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = harness.create_customer(&token, "Chị Hoa").await;
    harness.add_purchase(&token, &id, "2024-01-05", 10).await;

    let response = predict(&harness, &token, &id).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(harness.calls_to(FORECAST_PATH).await, 0);
}

#[tokio::test]
async fn malformed_model_output_stores_nothing() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(gemini_reply("Khách sẽ mua vào tuần sau."))
        .mount(&harness.mock)
        .await;

    let response = predict(&harness, &token, &id).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Prediction failed. Please try again."));
    let stored = harness.store.get(&CustomerId::new(id).unwrap()).unwrap();
    assert!(stored.prediction.is_none());
}

#[tokio::test]
async fn model_outage_is_bad_gateway() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"code": 503, "status": "UNAVAILABLE", "message": "overloaded"}
        })))
        .mount(&harness.mock)
        .await;

    predict(&harness, &token, &id)
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn forecast_for_changed_customer_is_discarded() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(gemini_reply(FORECAST_JSON))
        .mount(&harness.mock)
        .await;

    // Another device edits the customer; this session has not refreshed yet.
    let customer_id = CustomerId::new(id.clone()).unwrap();
    let auth = AuthContext::new(UserId::new("u1").unwrap(), "id-token-u1");
    harness
        .store
        .update_customer(&auth, &customer_id, &CustomerUpdate::rename("Cô Hoa").unwrap())
        .await
        .unwrap();

    let response = predict(&harness, &token, &id).await;

    response.assert_status(StatusCode::CONFLICT);
    assert!(harness.store.get(&customer_id).unwrap().prediction.is_none());
}

#[tokio::test]
async fn second_forecast_while_one_is_running_is_refused() {
    let harness = TestHarness::new().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(gemini_reply(FORECAST_JSON).set_delay(Duration::from_millis(500)))
        .mount(&harness.mock)
        .await;

    let (first, second) = tokio::join!(predict(&harness, &token, &id), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        predict(&harness, &token, &id).await
    });

    second.assert_status(StatusCode::CONFLICT);
    let body: Value = second.json();
    assert_eq!(body["error"]["code"], "conflict");

    first.assert_status_ok();
    let detail: Value = first.json();
    assert_eq!(detail["prediction"]["next_purchase_date"], "2024-02-04");
    assert_eq!(harness.calls_to(FORECAST_PATH).await, 1);
}

#[tokio::test]
async fn forecast_without_gemini_is_unavailable() {
    let harness = TestHarness::without_gemini().await;
    let token = harness.sign_in("u1").await;
    let id = customer_with_history(&harness, &token).await;

    let response = predict(&harness, &token, &id).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_configured");
}
