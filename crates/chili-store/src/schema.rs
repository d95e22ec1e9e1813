//! Document schema: collection and field names.
//!
//! These names match the documents the web client writes so
//! existing data keeps working.

/// The collection holding one document per customer.
pub const CUSTOMERS_COLLECTION: &str = "chili_customers";

/// Field names inside a customer document.
pub mod fields {
    /// Owning user's ID (string). The only field queries filter on.
    pub const USER_ID: &str = "userId";

    /// Display name (string).
    pub const NAME: &str = "name";

    /// Embedded purchase list (array of maps).
    pub const PURCHASES: &str = "purchases";

    /// Cached prediction (map or null).
    pub const PREDICTION: &str = "prediction";

    /// Server-assigned creation time (timestamp).
    pub const CREATED_AT: &str = "createdAt";
}

/// Field names inside an embedded purchase map.
pub mod purchase_fields {
    /// Purchase ID (UUID string).
    pub const ID: &str = "id";

    /// Day of purchase (`YYYY-MM-DD` string).
    pub const DATE: &str = "date";

    /// Quantity (integer).
    pub const QUANTITY: &str = "quantity";
}

/// Field names inside the embedded prediction map.
pub mod prediction_fields {
    /// Predicted next purchase day (`YYYY-MM-DD` string).
    pub const NEXT_PURCHASE_DATE: &str = "nextPurchaseDate";

    /// Predicted quantity (number).
    pub const EXPECTED_QUANTITY: &str = "expectedQuantity";

    /// Explanation (string).
    pub const REASONING: &str = "reasoning";
}
