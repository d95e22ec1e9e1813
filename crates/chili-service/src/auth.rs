//! Session authentication extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

/// A request authenticated by a session bearer token.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    /// The caller's session.
    pub session: Arc<Session>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let session = state
            .sessions
            .get(token)
            .await
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { session })
    }
}
