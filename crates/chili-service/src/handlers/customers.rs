//! Customer list and customer record handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use chili_core::{
    chart_series, ChartPoint, ChiliError, Customer, CustomerId, CustomerUpdate, Mirror, Prediction,
    Purchase,
};

use crate::auth::SessionAuth;
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

/// One row of the customer list.
#[derive(Debug, Serialize)]
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

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name.clone(),
            purchase_count: customer.purchases.len(),
            last_purchase_date: customer.purchases.last().map(|p| p.date),
            has_prediction: customer.prediction.is_some(),
            created_at: customer.created_at,
        }
    }
}

/// Customer list response.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Matching customers, newest first.
    pub customers: Vec<CustomerSummary>,
    /// Number of customers before filtering.
    pub total: usize,
    /// Selected customer, `None` in the empty state.
    pub selected_id: Option<String>,
    /// Guidance for the last failed refresh, if it has not recovered.
    pub sync_error: Option<String>,
}

/// Cached forecast as shown to the user.
#[derive(Debug, Serialize)]
pub struct PredictionView {
    /// Predicted next purchase day.
    pub next_purchase_date: NaiveDate,
    /// Predicted quantity.
    pub expected_quantity: f64,
    /// Model's explanation.
    pub reasoning: String,
}

impl From<&Prediction> for PredictionView {
    fn from(prediction: &Prediction) -> Self {
        Self {
            next_purchase_date: prediction.next_purchase_date,
            expected_quantity: prediction.expected_quantity,
            reasoning: prediction.reasoning.clone(),
        }
    }
}

/// Full customer record with its trend series.
#[derive(Debug, Serialize)]
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
    /// Whether a forecast is running for this session.
    pub predicting: bool,
    /// Whether this customer is selected.
    pub selected: bool,
}

impl CustomerDetail {
    pub(crate) fn build(customer: &Customer, mirror: &Mirror, session: &Session) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name.clone(),
            created_at: customer.created_at,
            purchases: customer.purchases.clone(),
            chart: chart_series(&customer.purchases),
            prediction: customer.prediction.as_ref().map(PredictionView::from),
            can_predict: customer.can_predict(),
            predicting: session.is_predicting(),
            selected: mirror.selected_id() == Some(&customer.id),
        }
    }
}

/// Parse a customer ID from the path.
pub(crate) fn parse_customer_id(raw: String) -> Result<CustomerId, ApiError> {
    CustomerId::new(raw).map_err(|e| ChiliError::from(e).into())
}

/// Read one customer from the session's mirror.
pub(crate) async fn load_detail(session: &Session, id: &CustomerId) -> Result<CustomerDetail, ApiError> {
    let mirror = session.mirror.read().await;
    let customer = mirror.require(id)?;
    Ok(CustomerDetail::build(customer, &mirror, session))
}

/// Clone one customer out of the session's mirror.
pub(crate) async fn load_customer(session: &Session, id: &CustomerId) -> Result<Customer, ApiError> {
    Ok(session.mirror.read().await.require(id)?.clone())
}

async fn dashboard(session: &Session, query: &str) -> DashboardResponse {
    let mirror = session.mirror.read().await;
    DashboardResponse {
        customers: mirror.search(query).map(CustomerSummary::from).collect(),
        total: mirror.customers().len(),
        selected_id: mirror.selected_id().map(ToString::to_string),
        sync_error: session.sync_error.read().await.clone(),
    }
}

/// Customer list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    /// Case-insensitive name filter.
    #[serde(default)]
    pub q: String,
}

/// List the signed-in user's customers.
pub async fn list_customers(
    auth: SessionAuth,
    Query(query): Query<ListCustomersQuery>,
) -> Json<DashboardResponse> {
    Json(dashboard(&auth.session, &query.q).await)
}

/// Re-query the store now.
pub async fn refresh_customers(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<Json<DashboardResponse>, ApiError> {
    state.sync.refresh(&auth.session).await?;
    Ok(Json(dashboard(&auth.session, "").await))
}

/// Customer name request body.
#[derive(Debug, Deserialize)]
pub struct CustomerNameRequest {
    /// Display name; surrounding whitespace is trimmed.
    pub name: String,
}

/// Create customer response.
#[derive(Debug, Serialize)]
pub struct CreatedCustomer {
    /// New customer ID.
    pub id: String,
}

/// Create a customer.
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Json(request): Json<CustomerNameRequest>,
) -> Result<(StatusCode, Json<CreatedCustomer>), ApiError> {
    let id = state.sync.create_customer(&auth.session, &request.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedCustomer { id: id.to_string() }),
    ))
}

/// Get one customer.
pub async fn get_customer(
    auth: SessionAuth,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    Ok(Json(load_detail(&auth.session, &id).await?))
}

/// Rename a customer.
pub async fn rename_customer(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path(id): Path<String>,
    Json(request): Json<CustomerNameRequest>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    let update = CustomerUpdate::rename(&request.name)?;
    load_customer(&auth.session, &id).await?;

    state.sync.update_customer(&auth.session, &id, &update).await?;
    Ok(Json(load_detail(&auth.session, &id).await?))
}

/// Delete a customer with its purchases and prediction.
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_customer_id(id)?;
    load_customer(&auth.session, &id).await?;

    state.sync.delete_customer(&auth.session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Select a customer.
pub async fn select_customer(
    auth: SessionAuth,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_customer_id(id)?;
    let session = &auth.session;

    let mut mirror = session.mirror.write().await;
    mirror.select(&id)?;
    let customer = mirror.require(&id)?;
    Ok(Json(CustomerDetail::build(customer, &mirror, session)))
}
