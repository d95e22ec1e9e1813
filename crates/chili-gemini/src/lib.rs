//! Gemini integration for ChiliPredict.
//!
//! Two uses of the same Generative Language REST API:
//!
//! - [`ForecastAdapter`]: turns a customer's purchase history into a prompt,
//!   requests a schema-constrained JSON completion and parses it into a
//!   [`chili_core::Prediction`]
//! - [`Assistant`] and [`ChatSession`]: a multi-turn business advisor chat
//!
//! # Example
//!
//! ```no_run
//! use chili_gemini::{ForecastAdapter, GeminiClient, DEFAULT_BASE_URL, DEFAULT_FORECAST_MODEL};
//! use std::time::Duration;
//!
//! # async fn example(customer: &chili_core::Customer) -> Result<(), chili_gemini::ForecastError> {
//! let client = GeminiClient::new(DEFAULT_BASE_URL, "api-key".to_string().into(), Duration::from_secs(60))?;
//! let forecaster = ForecastAdapter::new(client, DEFAULT_FORECAST_MODEL);
//!
//! let prediction = forecaster.forecast(customer).await?;
//! println!("next purchase on {}", prediction.next_purchase_date);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod assistant;
mod client;
mod error;
mod forecast;
pub mod types;

pub use assistant::{
    Assistant, ChatRole, ChatSession, ChatTurn, APOLOGY, DEFAULT_ASSISTANT_MODEL, GREETING,
    NO_ANSWER, PERSONA,
};
pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use error::{AssistantError, ForecastError, GeminiError, Result};
pub use forecast::{build_prompt, parse_prediction, ForecastAdapter, DEFAULT_FORECAST_MODEL};
