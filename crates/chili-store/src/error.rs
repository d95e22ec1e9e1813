//! Error types for customer storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// All of these are terminal for the operation that raised them; callers do
/// not retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The customer document does not exist.
    #[error("customer not found: {id}")]
    NotFound {
        /// The customer ID.
        id: String,
    },

    /// The caller may not read or write this data.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The query needs a composite index that does not exist.
    #[error("missing index: {0}")]
    MissingIndex(String),

    /// A write precondition failed (document changed or already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller's credentials were rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend returned an error not covered above.
    #[error("store API error: {status} ({code}) - {message}")]
    Api {
        /// HTTP status code.
        code: u16,
        /// Backend status name (e.g. `UNAVAILABLE`).
        status: String,
        /// Backend message.
        message: String,
    },

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Human-readable guidance shown to the user for this failure.
    #[must_use]
    pub fn guidance(&self) -> String {
        match self {
            Self::MissingIndex(_) => "This query requires an index. Create a composite index on \
                 'chili_customers' for 'userId' (ascending) and 'createdAt' (descending) in the \
                 Firebase console."
                .to_string(),
            Self::PermissionDenied(_) => "You do not have permission to access this data. Make \
                 sure the Firestore security rules are deployed as documented."
                .to_string(),
            Self::Unauthenticated(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::NotFound { .. } => "This customer no longer exists.".to_string(),
            Self::Conflict(_) => {
                "The customer changed while the request was running. Please try again.".to_string()
            }
            Self::Transport(msg) | Self::Serialization(msg) | Self::Api { message: msg, .. } => {
                format!("Failed to load data: {msg}")
            }
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
