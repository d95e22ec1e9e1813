//! API handlers.

pub mod assistant;
pub mod customers;
pub mod health;
pub mod prediction;
pub mod purchases;
pub mod session;
