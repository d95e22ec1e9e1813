//! Cloud Firestore REST backend.
//!
//! Every request is authenticated with the caller's Firebase ID token, so the
//! project's security rules see the same identity the web client would.
//!
//! # Operations
//!
//! - list: `POST …/documents:runQuery` filtered on `userId == <uid>` with no
//!   `orderBy`, so no composite index is needed
//! - create: `POST …/documents:commit` with `exists: false` and a `createdAt`
//!   `REQUEST_TIME` transform
//! - update: `PATCH …/chili_customers/<id>` with an update mask and either
//!   `currentDocument.exists=true` or `currentDocument.updateTime=<revision>`
//! - delete: `DELETE …/chili_customers/<id>`

mod types;
pub mod value;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;

use chili_core::{Customer, CustomerId, CustomerUpdate, NewCustomer};

use crate::error::{Result, StoreError};
use crate::paths::{auto_id, customer_document, customer_id_from_name, documents_root};
use crate::schema::{fields, CUSTOMERS_COLLECTION};
use crate::{AuthContext, Store};

use types::{
    CollectionSelector, CommitRequest, ErrorResponse, FieldFilter, FieldReference, FieldTransform,
    Filter, PatchRequest, Precondition, RunQueryRequest, RunQueryResponseItem, StructuredQuery,
    Write, WriteDocument,
};
use value::{
    decode_customer, encode_new_customer, encode_prediction, encode_purchases, format_timestamp,
    Fields, Value,
};

/// Default Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Which kind of call failed; the same backend status means different things
/// for queries and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Query,
    Write,
}

/// Firestore-backed store.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
}

impl FirestoreStore {
    /// Create a store for `project_id` talking to `base_url`
    /// (normally [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        })
    }

    /// The project this store reads from.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url)
    }

    async fn check(
        response: reqwest::Response,
        op: Operation,
        id: Option<&CustomerId>,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_error(status, &body, op, id))
    }
}

#[async_trait]
impl Store for FirestoreStore {
    #[tracing::instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    async fn list_customers(&self, auth: &AuthContext) -> Result<Vec<Customer>> {
        let url = self.url(&format!("{}:runQuery", documents_root(&self.project_id)));
        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: CUSTOMERS_COLLECTION.to_string(),
                }],
                filter: Filter {
                    field_filter: FieldFilter {
                        field: FieldReference {
                            field_path: fields::USER_ID.to_string(),
                        },
                        op: "EQUAL",
                        value: Value::StringValue(auth.user_id.to_string()),
                    },
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(auth.id_token.expose_secret())
            .json(&request)
            .send()
            .await?;
        let items: Vec<RunQueryResponseItem> =
            Self::check(response, Operation::Query, None).await?.json().await?;

        let mut customers = Vec::with_capacity(items.len());
        for doc in items.into_iter().filter_map(|item| item.document) {
            let Some(id) = customer_id_from_name(&doc.name) else {
                tracing::warn!(name = %doc.name, "Skipping document with unexpected name");
                continue;
            };
            match decode_customer(id, &doc.fields, doc.update_time.as_deref()) {
                Ok(customer) => customers.push(customer),
                Err(e) => {
                    tracing::warn!(name = %doc.name, error = %e, "Skipping unreadable document");
                }
            }
        }

        tracing::debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    #[tracing::instrument(skip(self, auth, new), fields(user_id = %auth.user_id))]
    async fn create_customer(&self, auth: &AuthContext, new: &NewCustomer) -> Result<CustomerId> {
        let id = auto_id();
        let url = self.url(&format!("{}:commit", documents_root(&self.project_id)));
        let request = CommitRequest {
            writes: vec![Write {
                update: WriteDocument {
                    name: customer_document(&self.project_id, &id),
                    fields: encode_new_customer(&new.owner, &new.name),
                },
                current_document: Precondition { exists: false },
                update_transforms: vec![FieldTransform {
                    field_path: fields::CREATED_AT.to_string(),
                    set_to_server_value: "REQUEST_TIME",
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(auth.id_token.expose_secret())
            .json(&request)
            .send()
            .await?;
        Self::check(response, Operation::Write, Some(&id)).await?;

        Ok(id)
    }

    #[tracing::instrument(skip(self, auth, id, update), fields(user_id = %auth.user_id, customer_id = %id))]
    async fn update_customer(
        &self,
        auth: &AuthContext,
        id: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<()> {
        let mut body = Fields::new();
        if let Some(name) = update.name() {
            body.insert(fields::NAME.into(), Value::StringValue(name.to_string()));
        }
        if let Some(purchases) = update.purchases() {
            body.insert(fields::PURCHASES.into(), encode_purchases(purchases));
        }
        if let Some(prediction) = update.prediction() {
            body.insert(fields::PREDICTION.into(), encode_prediction(prediction));
        }

        let mut query: Vec<(&str, String)> = update
            .field_paths()
            .into_iter()
            .map(|path| ("updateMask.fieldPaths", path.to_string()))
            .collect();
        match update.expected_revision() {
            Some(revision) => query.push(("currentDocument.updateTime", format_timestamp(&revision.0))),
            None => query.push(("currentDocument.exists", "true".to_string())),
        }

        let url = self.url(&customer_document(&self.project_id, id));
        let response = self
            .client
            .patch(&url)
            .bearer_auth(auth.id_token.expose_secret())
            .query(&query)
            .json(&PatchRequest { fields: body })
            .send()
            .await?;
        Self::check(response, Operation::Write, Some(id)).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, auth, id), fields(user_id = %auth.user_id, customer_id = %id))]
    async fn delete_customer(&self, auth: &AuthContext, id: &CustomerId) -> Result<()> {
        let url = self.url(&customer_document(&self.project_id, id));
        let response = self
            .client
            .delete(&url)
            .bearer_auth(auth.id_token.expose_secret())
            .send()
            .await?;
        Self::check(response, Operation::Write, Some(id)).await?;

        Ok(())
    }
}

/// Map an error response to a typed error.
///
/// `:runQuery` reports errors as a one-element array, everything else as an
/// object, so both shapes are accepted.
fn map_error(status: StatusCode, body: &str, op: Operation, id: Option<&CustomerId>) -> StoreError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok().or_else(|| {
        serde_json::from_str::<Vec<ErrorResponse>>(body)
            .ok()
            .and_then(|v| v.into_iter().next())
    });

    let Some(ErrorResponse { error }) = parsed else {
        return StoreError::Api {
            code: status.as_u16(),
            status: "UNKNOWN".to_string(),
            message: format!("HTTP {status}"),
        };
    };

    match (error.status.as_str(), op) {
        ("FAILED_PRECONDITION", Operation::Query) => StoreError::MissingIndex(error.message),
        ("FAILED_PRECONDITION" | "ALREADY_EXISTS" | "ABORTED", Operation::Write) => {
            StoreError::Conflict(error.message)
        }
        ("PERMISSION_DENIED", _) => StoreError::PermissionDenied(error.message),
        ("UNAUTHENTICATED", _) => StoreError::Unauthenticated(error.message),
        ("NOT_FOUND", _) => StoreError::NotFound {
            id: id.map_or_else(|| error.message.clone(), ToString::to_string),
        },
        (other, _) => StoreError::Api {
            code: if error.code == 0 { status.as_u16() } else { error.code },
            status: other.to_string(),
            message: error.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_precondition_depends_on_operation() {
        let body = r#"{"error":{"code":400,"message":"The query requires an index.","status":"FAILED_PRECONDITION"}}"#;

        assert!(matches!(
            map_error(StatusCode::BAD_REQUEST, body, Operation::Query, None),
            StoreError::MissingIndex(_)
        ));
        assert!(matches!(
            map_error(StatusCode::BAD_REQUEST, body, Operation::Write, None),
            StoreError::Conflict(_)
        ));
    }

    #[test]
    fn run_query_array_errors_are_understood() {
        let body = r#"[{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}]"#;
        assert_eq!(
            map_error(StatusCode::FORBIDDEN, body, Operation::Query, None),
            StoreError::PermissionDenied("Missing or insufficient permissions.".into())
        );
    }

    #[test]
    fn unparseable_error_body_is_generic() {
        let err = map_error(StatusCode::BAD_GATEWAY, "<html>", Operation::Query, None);
        assert!(matches!(err, StoreError::Api { code: 502, .. }));
    }

    #[test]
    fn not_found_names_the_customer() {
        let body = r#"{"error":{"code":404,"message":"No document to update","status":"NOT_FOUND"}}"#;
        let id = CustomerId::new("abc").unwrap();
        assert_eq!(
            map_error(StatusCode::NOT_FOUND, body, Operation::Write, Some(&id)),
            StoreError::NotFound { id: "abc".into() }
        );
    }
}
