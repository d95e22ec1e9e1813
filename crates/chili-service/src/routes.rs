//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{assistant, customers, health, prediction, purchases, session};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Maximum concurrent model calls (forecasts and assistant messages).
const MODEL_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/session` - Sign in
///
/// ## Session (bearer session token)
/// - `GET /v1/session` - Current identity
/// - `DELETE /v1/session` - Sign out
///
/// ## Customers
/// - `GET /v1/customers?q=` - Customer list with selection
/// - `POST /v1/customers` - Create customer
/// - `POST /v1/customers/refresh` - Re-query the store
/// - `GET|PATCH|DELETE /v1/customers/:id` - Read, rename, delete
/// - `POST /v1/customers/:id/select` - Select
/// - `POST /v1/customers/:id/purchases` - Record purchase
/// - `PATCH|DELETE /v1/customers/:id/purchases/:pid` - Edit, remove purchase
/// - `POST /v1/customers/:id/prediction` - Forecast next purchase
///
/// ## Assistant
/// - `GET /v1/assistant` - Transcript
/// - `POST /v1/assistant/messages` - Send message
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Model-backed routes wait on Gemini, so they get a tighter limit.
    let model_routes = Router::new()
        .route("/customers/:id/prediction", post(prediction::predict))
        .route("/assistant/messages", post(assistant::send_message))
        .layer(ConcurrencyLimitLayer::new(MODEL_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Session
        .route(
            "/session",
            post(session::sign_in)
                .get(session::get_session)
                .delete(session::sign_out),
        )
        // Customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/customers/refresh", post(customers::refresh_customers))
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .patch(customers::rename_customer)
                .delete(customers::delete_customer),
        )
        .route("/customers/:id/select", post(customers::select_customer))
        // Purchases
        .route("/customers/:id/purchases", post(purchases::add_purchase))
        .route(
            "/customers/:id/purchases/:pid",
            patch(purchases::edit_purchase).delete(purchases::delete_purchase),
        )
        // Assistant
        .route("/assistant", get(assistant::get_transcript))
        .merge(model_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
