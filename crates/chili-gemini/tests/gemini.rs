//! Forecast and assistant tests against a mocked Generative Language API.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chili_core::{ChiliError, Customer, CustomerId, Purchase, UserId};
use chili_gemini::{
    Assistant, AssistantError, ChatRole, ChatSession, ForecastAdapter, ForecastError,
    GeminiClient, GeminiError, APOLOGY, GREETING, NO_ANSWER, PERSONA,
};

const FORECAST_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";
const CHAT_PATH: &str = "/v1beta/models/gemini-3.1-pro-preview:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(
        server.uri(),
        "test-key".to_string().into(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

fn customer(purchases: &[(&str, u32)]) -> Customer {
    Customer {
        id: CustomerId::new("c1").unwrap(),
        owner: UserId::new("u1").unwrap(),
        name: "Chị Hoa".into(),
        purchases: purchases
            .iter()
            .map(|(d, q)| Purchase::new(d.parse().unwrap(), *q).unwrap())
            .collect(),
        prediction: None,
        created_at: None,
        revision: None,
    }
}

async fn sent_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn forecast_sends_history_and_returns_reply_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(text_reply(
            r#"{"nextPurchaseDate":"2024-02-04","expectedQuantity":17,"reasoning":"Khách mua mỗi 15 ngày, lượng tăng dần."}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = ForecastAdapter::new(client(&server), "gemini-2.5-flash-lite");
    let prediction = adapter
        .forecast(&customer(&[("2024-01-05", 10), ("2024-01-20", 15)]))
        .await
        .unwrap();

    assert_eq!(
        prediction.next_purchase_date,
        NaiveDate::from_ymd_opt(2024, 2, 4).unwrap()
    );
    assert!((prediction.expected_quantity - 17.0).abs() < f64::EPSILON);
    assert_eq!(prediction.reasoning, "Khách mua mỗi 15 ngày, lượng tăng dần.");

    let bodies = sent_bodies(&server).await;
    let prompt = bodies[0]["contents"][0]["parts"][0]["text"].as_str().unwrap();
    let first = prompt.find("- Ngày: 2024-01-05, Số lượng: 10 lít/chai").unwrap();
    let second = prompt.find("- Ngày: 2024-01-20, Số lượng: 15 lít/chai").unwrap();
    assert!(first < second);
    assert_eq!(bodies[0]["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn forecast_with_one_purchase_never_calls_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_reply("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = ForecastAdapter::new(client(&server), "gemini-2.5-flash-lite");
    let err = adapter
        .forecast(&customer(&[("2024-01-05", 10)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ForecastError::Validation(ChiliError::InsufficientHistory {
            actual: 1,
            required: 2
        })
    ));
}

#[tokio::test]
async fn forecast_rejects_prose_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(text_reply("Khoảng đầu tháng sau."))
        .mount(&server)
        .await;

    let adapter = ForecastAdapter::new(client(&server), "gemini-2.5-flash-lite");
    let err = adapter
        .forecast(&customer(&[("2024-01-05", 10), ("2024-01-20", 15)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::Malformed(_)));
}

#[tokio::test]
async fn forecast_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
        })))
        .mount(&server)
        .await;

    let adapter = ForecastAdapter::new(client(&server), "gemini-2.5-flash-lite");
    let err = adapter
        .forecast(&customer(&[("2024-01-05", 10), ("2024-01-20", 15)]))
        .await
        .unwrap_err();

    match err {
        ForecastError::Model(GeminiError::Api { code, status, .. }) => {
            assert_eq!(code, 503);
            assert_eq!(status, "UNAVAILABLE");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let adapter = ForecastAdapter::new(client(&server), "gemini-2.5-flash-lite");
    let err = adapter
        .forecast(&customer(&[("2024-01-05", 10), ("2024-01-20", 15)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::Model(GeminiError::RateLimited(Some(30)))));
}

#[tokio::test]
async fn invalid_api_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let assistant = Assistant::new(client(&server), "gemini-3.1-pro-preview");
    let mut session = ChatSession::new();
    let err = assistant.send(&mut session, "Chào").await.unwrap_err();

    assert!(matches!(err, AssistantError::Model(GeminiError::Unauthorized(_))));
}

#[tokio::test]
async fn chat_sends_full_history_with_persona_and_no_greeting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(text_reply("Bạn nên nhập hàng vào đầu tuần."))
        .mount(&server)
        .await;

    let assistant = Assistant::new(client(&server), "gemini-3.1-pro-preview");
    let mut session = ChatSession::new();

    let reply = assistant
        .send(&mut session, "  Khi nào nên nhập hàng?  ")
        .await
        .unwrap();
    assert_eq!(reply.role, ChatRole::Model);
    assert_eq!(reply.content, "Bạn nên nhập hàng vào đầu tuần.");

    assistant.send(&mut session, "Cảm ơn").await.unwrap();

    let bodies = sent_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["systemInstruction"]["parts"][0]["text"], PERSONA);
    assert_eq!(
        bodies[1]["contents"],
        json!([
            {"role": "user", "parts": [{"text": "Khi nào nên nhập hàng?"}]},
            {"role": "model", "parts": [{"text": "Bạn nên nhập hàng vào đầu tuần."}]},
            {"role": "user", "parts": [{"text": "Cảm ơn"}]}
        ])
    );

    let transcript: Vec<_> = session.turns().iter().map(|t| t.content.as_str()).collect();
    assert_eq!(transcript[0], GREETING);
    assert_eq!(transcript.len(), 5);
}

#[tokio::test]
async fn failed_exchange_stays_visible_but_leaves_the_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Internal error", "status": "INTERNAL"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(text_reply("Được."))
        .mount(&server)
        .await;

    let assistant = Assistant::new(client(&server), "gemini-3.1-pro-preview");
    let mut session = ChatSession::new();

    let err = assistant.send(&mut session, "Câu một").await.unwrap_err();
    assert!(matches!(err, AssistantError::Model(_)));
    let last = session.turns().last().unwrap();
    assert_eq!(last.content, APOLOGY);
    assert_eq!(session.turns()[1].content, "Câu một");

    assistant.send(&mut session, "Câu hai").await.unwrap();

    let bodies = sent_bodies(&server).await;
    assert_eq!(
        bodies[1]["contents"],
        json!([{"role": "user", "parts": [{"text": "Câu hai"}]}])
    );
}

#[tokio::test]
async fn empty_reply_uses_fallback_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let assistant = Assistant::new(client(&server), "gemini-3.1-pro-preview");
    let mut session = ChatSession::new();

    let reply = assistant.send(&mut session, "Chào").await.unwrap();
    assert_eq!(reply.content, NO_ANSWER);
}

#[tokio::test]
async fn blank_message_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_reply("x"))
        .expect(0)
        .mount(&server)
        .await;

    let assistant = Assistant::new(client(&server), "gemini-3.1-pro-preview");
    let mut session = ChatSession::new();

    assert!(matches!(
        assistant.send(&mut session, "   ").await,
        Err(AssistantError::EmptyMessage)
    ));
    assert_eq!(session.turns().len(), 1);
}
