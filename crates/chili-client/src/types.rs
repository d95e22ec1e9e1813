//! API request and response types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use chili_core::{ChartPoint, Purchase, PurchaseEdit};

// ============================================================================
// Session
// ============================================================================

/// Sign-in request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum SignInRequest<'a> {
    Password { email: &'a str, password: &'a str },
    Google { google_id_token: &'a str },
}

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    /// Firebase user ID.
    pub user_id: String,
    /// Email, if the account has one.
    pub email: Option<String>,
    /// Display name, if the account has one.
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInResponse {
    pub session_token: String,
    #[serde(flatten)]
    pub info: SessionInfo,
}

// ============================================================================
// Customers
// ============================================================================

/// One row of the customer list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerSummary {
    /// Customer ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Number of recorded purchases.
    pub purchase_count: usize,
    /// Most recent purchase day.
    pub last_purchase_date: Option<NaiveDate>,
    /// Whether a forecast is cached.
    pub has_prediction: bool,
    /// Creation time; `None` while pending on the server.
    pub created_at: Option<DateTime<Utc>>,
}

/// Customer list with the current selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dashboard {
    /// Matching customers, newest first.
    pub customers: Vec<CustomerSummary>,
    /// Number of customers before filtering.
    pub total: usize,
    /// Selected customer, `None` in the empty state.
    pub selected_id: Option<String>,
    /// Guidance for the last failed refresh, if it has not recovered.
    pub sync_error: Option<String>,
}

/// Cached forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionView {
    /// Predicted next purchase day.
    pub next_purchase_date: NaiveDate,
    /// Predicted quantity.
    pub expected_quantity: f64,
    /// Model's explanation.
    pub reasoning: String,
}

/// Full customer record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerDetail {
    /// Customer ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Purchases, oldest first.
    pub purchases: Vec<Purchase>,
    /// Trend series, one point per purchase.
    pub chart: Vec<ChartPoint>,
    /// Cached forecast.
    pub prediction: Option<PredictionView>,
    /// Whether enough history exists to request a forecast.
    pub can_predict: bool,
    /// Whether a forecast is running.
    pub predicting: bool,
    /// Whether this customer is selected.
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CustomerNameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedCustomer {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddPurchaseRequest {
    pub date: NaiveDate,
    pub quantity: u32,
}

// ============================================================================
// Assistant
// ============================================================================

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The signed-in user.
    User,
    /// The assistant.
    Model,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    /// Entry identifier.
    pub id: Uuid,
    /// Author.
    pub role: ChatRole,
    /// Text.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscriptResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyResponse {
    pub reply: ChatMessage,
}

// ============================================================================
// Health / errors
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
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

/// API error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
