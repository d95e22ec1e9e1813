//! Request and response types for the Firestore REST API.

use serde::{Deserialize, Serialize};

use super::value::{Fields, Value};

/// A document as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name.
    pub name: String,
    /// Field values.
    #[serde(default)]
    pub fields: Fields,
    /// Last update time (the document's revision).
    pub update_time: Option<String>,
}

/// `:runQuery` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    /// The query.
    pub structured_query: StructuredQuery,
}

/// A structured query over one collection.
#[derive(Debug, Serialize)]
pub struct StructuredQuery {
    /// Collections to query.
    pub from: Vec<CollectionSelector>,
    /// Filter.
    #[serde(rename = "where")]
    pub filter: Filter,
}

/// Collection selector.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    /// Collection ID.
    pub collection_id: String,
}

/// Query filter (only single-field equality is used).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Field filter.
    pub field_filter: FieldFilter,
}

/// Single-field filter.
#[derive(Debug, Serialize)]
pub struct FieldFilter {
    /// Field to compare.
    pub field: FieldReference,
    /// Operator, e.g. `EQUAL`.
    pub op: &'static str,
    /// Value to compare against.
    pub value: Value,
}

/// Reference to a document field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    /// Dotted field path.
    pub field_path: String,
}

/// One element of the `:runQuery` response stream.
///
/// Elements without `document` only carry progress information.
#[derive(Debug, Deserialize)]
pub struct RunQueryResponseItem {
    /// Matching document, if any.
    pub document: Option<Document>,
}

/// `:commit` request body.
#[derive(Debug, Serialize)]
pub struct CommitRequest {
    /// Writes applied atomically.
    pub writes: Vec<Write>,
}

/// A single write inside a commit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Document to write.
    pub update: WriteDocument,
    /// Precondition on the existing document.
    pub current_document: Precondition,
    /// Server-side field transforms applied after the update.
    pub update_transforms: Vec<FieldTransform>,
}

/// Document body of a write.
#[derive(Debug, Serialize)]
pub struct WriteDocument {
    /// Full resource name.
    pub name: String,
    /// Field values.
    pub fields: Fields,
}

/// Write precondition.
#[derive(Debug, Serialize)]
pub struct Precondition {
    /// Require the document to exist (or not).
    pub exists: bool,
}

/// Server-side field transform.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    /// Field to transform.
    pub field_path: String,
    /// Server value to set, e.g. `REQUEST_TIME`.
    pub set_to_server_value: &'static str,
}

/// `PATCH` request body.
#[derive(Debug, Serialize)]
pub struct PatchRequest {
    /// Only the fields named in the update mask.
    pub fields: Fields,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorBody,
}

/// Error body.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    #[serde(default)]
    pub code: u16,
    /// Message.
    #[serde(default)]
    pub message: String,
    /// Canonical status name (e.g. `PERMISSION_DENIED`).
    #[serde(default)]
    pub status: String,
}
