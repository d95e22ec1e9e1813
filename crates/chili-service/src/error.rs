//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use chili_core::ChiliError;
use chili_gemini::{AssistantError, ForecastError, GeminiError};
use chili_store::StoreError;

use crate::identity::IdentityError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, unknown or expired session.
    #[error("unauthorized")]
    Unauthorized,

    /// The identity provider rejected the sign-in.
    #[error("sign-in failed: {reason}")]
    SignInFailed {
        /// Provider reason code.
        reason: String,
    },

    /// The store refused access.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Well-formed input that breaks a domain rule.
    #[error("{0}")]
    Validation(String),

    /// Conflict - concurrent change or an operation already in progress.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store needs a composite index.
    #[error("missing index: {0}")]
    MissingIndex(String),

    /// A required integration is not configured.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::SignInFailed { reason } => (
                StatusCode::UNAUTHORIZED,
                "sign_in_failed",
                "Sign-in failed. Please try again.".to_string(),
                Some(serde_json::json!({ "reason": reason })),
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                msg.clone(),
                None,
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::MissingIndex(msg) => (
                StatusCode::PRECONDITION_FAILED,
                "missing_index",
                msg.clone(),
                None,
            ),
            Self::NotConfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                format!("{what} is not configured"),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChiliError> for ApiError {
    fn from(err: ChiliError) -> Self {
        match err {
            ChiliError::CustomerNotFound { .. } | ChiliError::PurchaseNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            ChiliError::InvalidId(_) => Self::BadRequest(err.to_string()),
            ChiliError::EmptyName
            | ChiliError::InvalidQuantity(_)
            | ChiliError::EmptyEdit
            | ChiliError::InsufficientHistory { .. } => Self::Validation(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let guidance = err.guidance();
        match err {
            StoreError::NotFound { .. } => Self::NotFound(guidance),
            StoreError::PermissionDenied(_) => Self::Forbidden(guidance),
            StoreError::MissingIndex(_) => Self::MissingIndex(guidance),
            StoreError::Conflict(_) => Self::Conflict(guidance),
            StoreError::Unauthenticated(_) => Self::Unauthorized,
            StoreError::Transport(_) | StoreError::Api { .. } => Self::ExternalService(guidance),
            StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected { reason, .. } => Self::SignInFailed { reason },
            IdentityError::Http(e) => Self::ExternalService(format!("identity provider: {e}")),
            IdentityError::Parse(msg) => Self::ExternalService(format!("identity provider: {msg}")),
            IdentityError::Configuration(msg) => Self::Internal(msg),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Validation(e) => e.into(),
            ForecastError::Model(GeminiError::Configuration(msg)) => Self::Internal(msg),
            ForecastError::Model(_) | ForecastError::EmptyResponse | ForecastError::Malformed(_) => {
                Self::ExternalService(format!("Prediction failed. Please try again. ({err})"))
            }
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::EmptyMessage => Self::Validation(err.to_string()),
            AssistantError::Model(_) => Self::ExternalService(chili_gemini::APOLOGY.to_string()),
        }
    }
}
