//! Cached purchase forecasts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A forecast of a customer's next purchase.
///
/// Produced only by the forecast adapter and cached on the customer record.
/// Field names follow the stored document shape (`nextPurchaseDate`,
/// `expectedQuantity`, `reasoning`), which is also the JSON the model is asked
/// to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Predicted day of the next purchase.
    pub next_purchase_date: NaiveDate,

    /// Predicted quantity of the next purchase.
    pub expected_quantity: f64,

    /// Short free-text explanation of the forecast.
    pub reasoning: String,
}
