//! Firestore typed value encoding.
//!
//! The REST API represents every field as a single-key object naming its type,
//! e.g. `{"stringValue": "x"}` or `{"integerValue": "10"}` (64-bit integers are
//! strings on the wire). This module converts customer documents to and from
//! that representation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use chili_core::{Customer, CustomerId, Prediction, Purchase, Revision, UserId};

use crate::error::{Result, StoreError};
use crate::schema::{fields, prediction_fields, purchase_fields};

/// A Firestore field map.
pub type Fields = BTreeMap<String, Value>;

/// A Firestore typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// `null`.
    NullValue(()),
    /// Boolean.
    BooleanValue(bool),
    /// 64-bit integer, encoded as a decimal string.
    IntegerValue(String),
    /// Double.
    DoubleValue(f64),
    /// RFC 3339 timestamp.
    TimestampValue(String),
    /// UTF-8 string.
    StringValue(String),
    /// Array.
    ArrayValue(ArrayValue),
    /// Nested map.
    MapValue(MapValue),
}

/// Array payload. Empty arrays arrive as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Elements.
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Map payload. Empty maps arrive as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Entries.
    #[serde(default)]
    pub fields: Fields,
}

impl Value {
    fn string(s: impl Into<String>) -> Self {
        Self::StringValue(s.into())
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::DoubleValue(d) => Some(*d),
            Self::IntegerValue(i) => i.parse::<i64>().ok().map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let f = i as f64;
                f
            }),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Self::IntegerValue(i) => i.parse().ok(),
            Self::DoubleValue(d) if d.fract() == 0.0 && *d >= 0.0 && *d <= f64::from(u32::MAX) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let q = *d as u32;
                Some(q)
            }
            _ => None,
        }
    }
}

/// Encode a purchase list.
#[must_use]
pub fn encode_purchases(purchases: &[Purchase]) -> Value {
    Value::ArrayValue(ArrayValue {
        values: purchases.iter().map(encode_purchase).collect(),
    })
}

fn encode_purchase(purchase: &Purchase) -> Value {
    let mut map = Fields::new();
    map.insert(purchase_fields::ID.into(), Value::string(purchase.id.to_string()));
    map.insert(
        purchase_fields::DATE.into(),
        Value::string(purchase.date.format("%Y-%m-%d").to_string()),
    );
    map.insert(
        purchase_fields::QUANTITY.into(),
        Value::IntegerValue(purchase.quantity.to_string()),
    );
    Value::MapValue(MapValue { fields: map })
}

/// Encode an optional prediction (`None` becomes `null`).
#[must_use]
pub fn encode_prediction(prediction: Option<&Prediction>) -> Value {
    let Some(prediction) = prediction else {
        return Value::NullValue(());
    };
    let mut map = Fields::new();
    map.insert(
        prediction_fields::NEXT_PURCHASE_DATE.into(),
        Value::string(prediction.next_purchase_date.format("%Y-%m-%d").to_string()),
    );
    map.insert(
        prediction_fields::EXPECTED_QUANTITY.into(),
        Value::DoubleValue(prediction.expected_quantity),
    );
    map.insert(
        prediction_fields::REASONING.into(),
        Value::string(prediction.reasoning.clone()),
    );
    Value::MapValue(MapValue { fields: map })
}

/// Encode the fields of a freshly created customer (without `createdAt`, which
/// the server sets).
#[must_use]
pub fn encode_new_customer(owner: &UserId, name: &str) -> Fields {
    let mut map = Fields::new();
    map.insert(fields::USER_ID.into(), Value::string(owner.as_str()));
    map.insert(fields::NAME.into(), Value::string(name));
    map.insert(fields::PURCHASES.into(), encode_purchases(&[]));
    map.insert(fields::PREDICTION.into(), Value::NullValue(()));
    map
}

/// Format a revision the way the API expects it in preconditions.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the timestamp is malformed.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

/// Decode a customer document.
///
/// `update_time` is the document's server update time, used as its revision.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if a required field is missing or has
/// the wrong type.
pub fn decode_customer(id: CustomerId, doc: &Fields, update_time: Option<&str>) -> Result<Customer> {
    let owner = required_str(doc, fields::USER_ID)?;
    let owner = UserId::new(owner).map_err(|e| bad_field(fields::USER_ID, &e.to_string()))?;
    let name = required_str(doc, fields::NAME)?.to_string();

    let purchases = match doc.get(fields::PURCHASES) {
        None | Some(Value::NullValue(())) => Vec::new(),
        Some(Value::ArrayValue(array)) => array
            .values
            .iter()
            .map(decode_purchase)
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(bad_field(fields::PURCHASES, "expected array")),
    };

    // The forecast is a cache; one the model wrote in another shape is dropped
    // rather than hiding the customer.
    let prediction = match doc.get(fields::PREDICTION) {
        None | Some(Value::NullValue(())) => None,
        Some(Value::MapValue(map)) => match decode_prediction(&map.fields) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                tracing::warn!(customer_id = %id, error = %e, "Ignoring unreadable prediction");
                None
            }
        },
        Some(_) => {
            tracing::warn!(customer_id = %id, "Ignoring prediction that is not a map");
            None
        }
    };

    let created_at = match doc.get(fields::CREATED_AT) {
        Some(Value::TimestampValue(ts)) => Some(parse_timestamp(ts)?),
        _ => None,
    };

    let revision = update_time.map(parse_timestamp).transpose()?.map(Revision);

    Ok(Customer {
        id,
        owner,
        name,
        purchases,
        prediction,
        created_at,
        revision,
    })
}

fn decode_purchase(value: &Value) -> Result<Purchase> {
    let Value::MapValue(map) = value else {
        return Err(bad_field(fields::PURCHASES, "expected map element"));
    };
    let doc = &map.fields;

    let id = required_str(doc, purchase_fields::ID)?
        .parse()
        .map_err(|_| bad_field(purchase_fields::ID, "expected UUID"))?;
    let date = parse_day(required_str(doc, purchase_fields::DATE)?, purchase_fields::DATE)?;
    let quantity = doc
        .get(purchase_fields::QUANTITY)
        .and_then(Value::as_u32)
        .ok_or_else(|| bad_field(purchase_fields::QUANTITY, "expected non-negative integer"))?;

    Ok(Purchase { id, date, quantity })
}

fn decode_prediction(doc: &Fields) -> Result<Prediction> {
    let next_purchase_date = parse_day(
        required_str(doc, prediction_fields::NEXT_PURCHASE_DATE)?,
        prediction_fields::NEXT_PURCHASE_DATE,
    )?;
    let expected_quantity = doc
        .get(prediction_fields::EXPECTED_QUANTITY)
        .and_then(Value::as_f64)
        .ok_or_else(|| bad_field(prediction_fields::EXPECTED_QUANTITY, "expected number"))?;
    let reasoning = required_str(doc, prediction_fields::REASONING)?.to_string();

    Ok(Prediction {
        next_purchase_date,
        expected_quantity,
        reasoning,
    })
}

fn required_str<'a>(doc: &'a Fields, field: &str) -> Result<&'a str> {
    doc.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| bad_field(field, "expected string"))
}

fn parse_day(raw: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| bad_field(field, "expected YYYY-MM-DD"))
}

fn bad_field(field: &str, detail: &str) -> StoreError {
    StoreError::Serialization(format!("field {field:?}: {detail}"))
}
