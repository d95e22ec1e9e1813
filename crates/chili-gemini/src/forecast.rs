//! Next-purchase forecasting.
//!
//! The purchase history is rendered into a Vietnamese prompt, one line per
//! purchase in chronological order, and the model is asked for a JSON object
//! matching [`Prediction`]'s stored shape. A customer with fewer than two
//! purchases is rejected before any request is made.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chili_core::{Customer, Prediction};

use crate::client::GeminiClient;
use crate::error::ForecastError;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Schema, SchemaType};

/// Default model for forecasts.
pub const DEFAULT_FORECAST_MODEL: &str = "gemini-2.5-flash-lite";

const NEXT_PURCHASE_DATE: &str = "nextPurchaseDate";
const EXPECTED_QUANTITY: &str = "expectedQuantity";
const REASONING: &str = "reasoning";

/// Forecasts a customer's next purchase with a Gemini model.
#[derive(Debug, Clone)]
pub struct ForecastAdapter {
    client: GeminiClient,
    model: String,
}

impl ForecastAdapter {
    /// Create an adapter using `model`.
    #[must_use]
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// The model used for forecasts.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forecast the next purchase of `customer`.
    ///
    /// Nothing is written; the caller stores the result.
    ///
    /// # Errors
    ///
    /// - `ForecastError::Validation` if the customer has fewer than two purchases
    /// - `ForecastError::Model` if the request fails
    /// - `ForecastError::EmptyResponse` / `ForecastError::Malformed` if the
    ///   reply is not a forecast
    #[tracing::instrument(skip(self, customer), fields(customer_id = %customer.id, model = %self.model))]
    pub async fn forecast(&self, customer: &Customer) -> Result<Prediction, ForecastError> {
        customer.ensure_predictable()?;

        let request = forecast_request(customer);
        let response = self.client.generate_content(&self.model, &request).await?;
        let text = response.text().ok_or(ForecastError::EmptyResponse)?;

        let prediction = parse_prediction(&text)?;
        tracing::debug!(
            next_purchase_date = %prediction.next_purchase_date,
            expected_quantity = prediction.expected_quantity,
            "Forecast received"
        );
        Ok(prediction)
    }
}

/// Render the forecast prompt for `customer`.
///
/// Purchases appear in list order, which is ascending by date.
#[must_use]
pub fn build_prompt(customer: &Customer) -> String {
    let mut prompt = format!(
        "Tôi là một người kinh doanh tương ớt bán buôn. Dưới đây là lịch sử mua hàng của khách hàng \"{}\":\n",
        customer.name
    );
    for purchase in &customer.purchases {
        let _ = writeln!(
            prompt,
            "- Ngày: {}, Số lượng: {} lít/chai",
            purchase.date.format("%Y-%m-%d"),
            purchase.quantity
        );
    }
    prompt.push_str(
        "\nDựa vào dữ liệu trên, hãy dự đoán:\n\
         1. Ngày khách hàng này có khả năng sẽ mua hàng tiếp theo (định dạng YYYY-MM-DD).\n\
         2. Số lượng dự kiến họ sẽ mua.\n\
         3. Lý do ngắn gọn cho dự đoán này (bằng tiếng Việt).\n",
    );
    prompt
}

fn forecast_request(customer: &Customer) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(build_prompt(customer))],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(prediction_schema()),
        }),
    }
}

fn prediction_schema() -> Schema {
    let properties = BTreeMap::from([
        (
            NEXT_PURCHASE_DATE.to_string(),
            Schema::scalar(SchemaType::String, Some("YYYY-MM-DD")),
        ),
        (
            EXPECTED_QUANTITY.to_string(),
            Schema::scalar(SchemaType::Number, None),
        ),
        (REASONING.to_string(), Schema::scalar(SchemaType::String, None)),
    ]);

    Schema {
        kind: SchemaType::Object,
        description: None,
        properties,
        required: vec![
            NEXT_PURCHASE_DATE.to_string(),
            EXPECTED_QUANTITY.to_string(),
            REASONING.to_string(),
        ],
    }
}

/// Parse the model's JSON reply.
///
/// # Errors
///
/// Returns `ForecastError::Malformed` if the text is not a JSON object with a
/// `YYYY-MM-DD` date, a finite non-negative quantity and a reasoning string.
pub fn parse_prediction(text: &str) -> Result<Prediction, ForecastError> {
    let prediction: Prediction =
        serde_json::from_str(text.trim()).map_err(|e| ForecastError::Malformed(e.to_string()))?;

    if !prediction.expected_quantity.is_finite() || prediction.expected_quantity < 0.0 {
        return Err(ForecastError::Malformed(format!(
            "expected quantity {} is not a non-negative number",
            prediction.expected_quantity
        )));
    }

    Ok(prediction)
}
