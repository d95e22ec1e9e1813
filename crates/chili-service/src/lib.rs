//! ChiliPredict HTTP API service.
//!
//! This crate provides the HTTP API for ChiliPredict, including:
//!
//! - Sign-in through Firebase Authentication (email/password or Google)
//! - A per-session mirror of the user's customers, kept fresh in the background
//! - Customer and purchase management
//! - Purchase forecasts and a business assistant backed by Gemini
//!
//! # Authentication
//!
//! `POST /v1/session` returns an opaque session token. Every other `/v1`
//! route expects it as `Authorization: Bearer <token>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers stay async for a uniform router

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod routes;
pub mod session;
pub mod state;
pub mod sync;

pub use config::{ServiceConfig, StoreBackend};
pub use error::ApiError;
pub use identity::{IdentityClient, IdentityError, IdentityTokens};
pub use routes::create_router;
pub use session::{Session, SessionRegistry};
pub use state::AppState;
pub use sync::SyncEngine;
