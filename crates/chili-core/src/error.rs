//! Error types for ChiliPredict domain rules.

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, ChiliError>;

/// Errors raised by domain validation, before anything reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChiliError {
    /// Customer names must contain at least one non-whitespace character.
    #[error("customer name must not be empty")]
    EmptyName,

    /// Purchase quantities are positive integers.
    #[error("invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(u32),

    /// A purchase edit changed nothing.
    #[error("purchase edit has no changes")]
    EmptyEdit,

    /// Customer not present in the signed-in user's collection.
    #[error("customer not found: {customer_id}")]
    CustomerNotFound {
        /// The customer ID that was not found.
        customer_id: String,
    },

    /// Purchase not present in the customer's history.
    #[error("purchase not found: {purchase_id}")]
    PurchaseNotFound {
        /// The purchase ID that was not found.
        purchase_id: String,
    },

    /// Forecasting needs a minimum purchase history.
    #[error("insufficient purchase history: have {actual}, need at least {required}")]
    InsufficientHistory {
        /// Number of purchases on record.
        actual: usize,
        /// Minimum number of purchases required.
        required: usize,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
