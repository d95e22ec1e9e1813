//! Common test utilities for chili-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chili_service::{create_router, AppState, ServiceConfig, StoreBackend};
use chili_store::MemoryStore;

/// Path the forecast model is called on.
pub const FORECAST_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";

/// Path the assistant model is called on.
pub const CHAT_PATH: &str = "/v1beta/models/gemini-3.1-pro-preview:generateContent";

/// Path the password sign-in is served on.
pub const SIGN_IN_PATH: &str = "/identity/accounts:signInWithPassword";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Stands in for Firebase Auth and Gemini.
    pub mock: MockServer,
    /// The backing store, shared with the service.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a harness with every integration configured.
    pub async fn new() -> Self {
        Self::build(true).await
    }

    /// Create a harness without a Gemini key.
    pub async fn without_gemini() -> Self {
        Self::build(false).await
    }

    async fn build(gemini: bool) -> Self {
        let mock = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            store_backend: StoreBackend::Memory,
            firebase_api_key: Some("test-firebase-key".to_string().into()),
            identity_base_url: format!("{}/identity", mock.uri()),
            secure_token_base_url: format!("{}/securetoken", mock.uri()),
            gemini_api_key: gemini.then(|| "test-gemini-key".to_string().into()),
            gemini_base_url: mock.uri(),
            // Tests drive refreshes explicitly.
            sync_interval_seconds: 3600,
            request_timeout_seconds: 10,
            ..ServiceConfig::default()
        };

        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            mock,
            store,
        }
    }

    /// Sign `uid` in with a password and return the session token.
    pub async fn sign_in(&self, uid: &str) -> String {
        let email = format!("{uid}@example.com");

        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .and(body_partial_json(json!({ "email": email })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": uid,
                "email": email,
                "displayName": format!("User {uid}"),
                "idToken": format!("id-token-{uid}"),
                "refreshToken": format!("refresh-token-{uid}"),
                "expiresIn": "3600"
            })))
            .mount(&self.mock)
            .await;

        let response = self
            .server
            .post("/v1/session")
            .json(&json!({ "email": email, "password": "secret" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        body["session_token"]
            .as_str()
            .expect("sign-in returns a session token")
            .to_string()
    }

    /// Create a customer and return its ID.
    pub async fn create_customer(&self, token: &str, name: &str) -> String {
        let response = self
            .server
            .post("/v1/customers")
            .add_header(AUTHORIZATION, bearer(token))
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        body["id"].as_str().expect("customer id").to_string()
    }

    /// Record a purchase and return the customer detail.
    pub async fn add_purchase(&self, token: &str, id: &str, date: &str, quantity: u32) -> Value {
        let response = self
            .server
            .post(&format!("/v1/customers/{id}/purchases"))
            .add_header(AUTHORIZATION, bearer(token))
            .json(&json!({ "date": date, "quantity": quantity }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    /// Fetch the customer list.
    pub async fn dashboard(&self, token: &str) -> Value {
        let response = self
            .server
            .get("/v1/customers")
            .add_header(AUTHORIZATION, bearer(token))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Number of requests the mock received on `request_path`.
    pub async fn calls_to(&self, request_path: &str) -> usize {
        self.mock
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }
}

/// `Authorization` header value for a session token.
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value")
}

/// A successful Gemini reply carrying `text`.
pub fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}
