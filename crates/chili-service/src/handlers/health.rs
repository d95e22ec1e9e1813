//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Whether sign-in is available.
    pub identity_configured: bool,
    /// Whether forecasts and the assistant are available.
    pub gemini_configured: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "chili-predict".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity_configured: state.has_identity(),
        gemini_configured: state.has_gemini(),
    })
}
