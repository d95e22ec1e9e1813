//! Forecast handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use chili_core::CustomerUpdate;

use crate::auth::SessionAuth;
use crate::error::ApiError;
use crate::handlers::customers::{load_customer, load_detail, parse_customer_id, CustomerDetail};
use crate::state::AppState;

/// Forecast a customer's next purchase and cache the result on the customer.
///
/// The forecast is stored only if the customer has not changed since it was
/// read; otherwise the request fails with a conflict and nothing is written.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    let session = &auth.session;
    let forecaster = state
        .forecaster
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Gemini".into()))?;

    let _slot = session
        .begin_prediction()
        .ok_or_else(|| ApiError::Conflict("A prediction is already in progress".into()))?;

    let customer = load_customer(session, &id).await?;
    customer.ensure_predictable()?;

    let prediction = forecaster.forecast(&customer).await.map_err(|e| {
        tracing::warn!(customer_id = %id, error = %e, "Forecast failed");
        e
    })?;

    let update = CustomerUpdate::store_prediction(prediction, customer.revision);
    state.sync.update_customer(session, &id, &update).await?;

    tracing::info!(
        user_id = %session.user_id(),
        customer_id = %id,
        model = %forecaster.model(),
        "Prediction stored"
    );
    Ok(Json(load_detail(session, &id).await?))
}
