//! Core types and rules for ChiliPredict.
//!
//! This crate holds the domain model shared by every other crate:
//!
//! - **Identifiers**: `UserId`, `CustomerId`, `PurchaseId`
//! - **Customers**: `Customer`, `NewCustomer`, `CustomerUpdate`, `Revision`
//! - **Purchases**: `Purchase`, `PurchaseEdit`
//! - **Predictions**: `Prediction`
//! - **Mirror**: `Mirror`, the owner-scoped local view of a user's customers
//! - **Chart**: `ChartPoint`, the purchase trend series
//!
//! # Prediction validity
//!
//! A cached [`Prediction`] is only meaningful for the purchase list it was
//! computed from. Every update that rewrites the purchase list is built by
//! [`CustomerUpdate`] constructors that clear the prediction in the same
//! update, so a store applying the update atomically can never hold a
//! prediction next to a purchase list it was not computed from.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chart;
pub mod customer;
pub mod error;
pub mod ids;
pub mod mirror;
pub mod prediction;
pub mod purchase;

pub use chart::{chart_series, ChartPoint, CHART_DATE_FORMAT};
pub use customer::{
    sort_newest_first, Customer, CustomerUpdate, NewCustomer, Revision, MIN_PURCHASES_FOR_PREDICTION,
};
pub use error::{ChiliError, Result};
pub use ids::{CustomerId, IdError, PurchaseId, UserId};
pub use mirror::{Mirror, SnapshotOutcome};
pub use prediction::Prediction;
pub use purchase::{sort_by_date, Purchase, PurchaseEdit};
