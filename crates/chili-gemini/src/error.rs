//! Error types for the Gemini integration.

use thiserror::Error;

use chili_core::ChiliError;

/// Result type for Gemini client calls.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Errors from the Generative Language API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        code: u16,
        /// Canonical status name, e.g. `INVALID_ARGUMENT`.
        status: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0:?} seconds")]
    RateLimited(Option<u64>),

    /// The API key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse a response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors from forecasting a customer's next purchase.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The customer does not have enough history.
    #[error(transparent)]
    Validation(#[from] ChiliError),

    /// The model request failed.
    #[error("forecast request failed: {0}")]
    Model(#[from] GeminiError),

    /// The model returned no text.
    #[error("the model returned an empty forecast")]
    EmptyResponse,

    /// The model's text was not a valid forecast.
    #[error("malformed forecast: {0}")]
    Malformed(String),
}

/// Errors from the business assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The message was blank.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The model request failed. The transcript already holds the apology.
    #[error("assistant request failed: {0}")]
    Model(#[from] GeminiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_names_status() {
        let err = GeminiError::Api {
            code: 400,
            status: "INVALID_ARGUMENT".into(),
            message: "Invalid JSON payload".into(),
        };
        assert_eq!(err.to_string(), "API error (INVALID_ARGUMENT): Invalid JSON payload");
    }

    #[test]
    fn insufficient_history_passes_through() {
        let err = ForecastError::from(ChiliError::InsufficientHistory {
            actual: 1,
            required: 2,
        });
        assert_eq!(
            err.to_string(),
            ChiliError::InsufficientHistory {
                actual: 1,
                required: 2
            }
            .to_string()
        );
    }
}
