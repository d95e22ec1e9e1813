//! Client error types.

/// Errors that can occur when using the ChiliPredict client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The identity provider rejected the sign-in.
    #[error("sign-in failed: {reason}")]
    SignInFailed {
        /// Provider reason code, e.g. `INVALID_LOGIN_CREDENTIALS`.
        reason: String,
    },

    /// The session is missing or has expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A call that needs a session was made before signing in.
    #[error("not signed in")]
    NotSignedIn,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
