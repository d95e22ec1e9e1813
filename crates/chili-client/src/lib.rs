//! ChiliPredict Client SDK.
//!
//! This crate provides a client library for front ends to drive the
//! ChiliPredict API: sign in, manage customers and purchases, request
//! forecasts and talk to the business assistant.
//!
//! # Example
//!
//! ```no_run
//! use chili_client::ChiliClient;
//!
//! # async fn example() -> Result<(), chili_client::ClientError> {
//! let mut client = ChiliClient::new("http://localhost:8080")?;
//! client.sign_in_with_password("owner@example.com", "secret").await?;
//!
//! let id = client.create_customer("Chị Hoa").await?;
//! client.add_purchase(&id, "2024-01-05".parse().unwrap(), 10).await?;
//! client.add_purchase(&id, "2024-01-20".parse().unwrap(), 15).await?;
//!
//! let detail = client.predict(&id).await?;
//! if let Some(prediction) = detail.prediction {
//!     println!("Next purchase: {}", prediction.next_purchase_date);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ChiliClient, ClientOptions};
pub use error::ClientError;
pub use types::*;
