//! Purchase history handlers.
//!
//! Every change rewrites the purchase list and clears the cached forecast in
//! one update.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use chili_core::{ChiliError, PurchaseEdit, PurchaseId};

use crate::auth::SessionAuth;
use crate::error::ApiError;
use crate::handlers::customers::{load_customer, load_detail, parse_customer_id, CustomerDetail};
use crate::state::AppState;

/// New purchase request body.
#[derive(Debug, Deserialize)]
pub struct AddPurchaseRequest {
    /// Purchase day, `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Quantity, at least 1.
    pub quantity: u32,
}

/// Record a purchase.
pub async fn add_purchase(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path(id): Path<String>,
    Json(request): Json<AddPurchaseRequest>,
) -> Result<(StatusCode, Json<CustomerDetail>), ApiError> {
    let id = parse_customer_id(id)?;
    let customer = load_customer(&auth.session, &id).await?;

    let (purchase, update) = customer.add_purchase(request.date, request.quantity)?;
    state.sync.update_customer(&auth.session, &id, &update).await?;

    tracing::debug!(customer_id = %id, purchase_id = %purchase.id, "Purchase recorded");
    Ok((StatusCode::CREATED, Json(load_detail(&auth.session, &id).await?)))
}

/// Change a purchase's date and/or quantity.
pub async fn edit_purchase(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path((id, purchase_id)): Path<(String, String)>,
    Json(edit): Json<PurchaseEdit>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    let purchase_id = parse_purchase_id(&purchase_id)?;
    let customer = load_customer(&auth.session, &id).await?;

    let update = customer.edit_purchase(&purchase_id, &edit)?;
    state.sync.update_customer(&auth.session, &id, &update).await?;

    tracing::debug!(customer_id = %id, purchase_id = %purchase_id, "Purchase edited");
    Ok(Json(load_detail(&auth.session, &id).await?))
}

/// Remove a purchase.
pub async fn delete_purchase(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path((id, purchase_id)): Path<(String, String)>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    let purchase_id = parse_purchase_id(&purchase_id)?;
    let customer = load_customer(&auth.session, &id).await?;

    let update = customer.remove_purchase(&purchase_id)?;
    state.sync.update_customer(&auth.session, &id, &update).await?;

    tracing::debug!(customer_id = %id, purchase_id = %purchase_id, "Purchase deleted");
    Ok(Json(load_detail(&auth.session, &id).await?))
}

fn parse_purchase_id(raw: &str) -> Result<PurchaseId, ApiError> {
    raw.parse::<PurchaseId>()
        .map_err(|e| ChiliError::from(e).into())
}
