//! Identifier types for ChiliPredict.
//!
//! User and customer IDs are opaque strings assigned by Firebase (Auth `localId`
//! and Firestore auto-generated document IDs). Purchase IDs are UUIDs generated
//! client-side, since purchases live embedded inside a customer document and have
//! no server identity of their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines an opaque string identifier assigned by a remote service.
///
/// Generated types reject empty values and values containing `/`, which would
/// break Firestore document paths.
macro_rules! string_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier after validating it.
            ///
            /// # Errors
            ///
            /// Returns an error if the identifier is empty or contains `/`.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdError::Empty);
                }
                if value.contains('/') {
                    return Err(IdError::InvalidCharacter('/'));
                }
                Ok(Self(value))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_type!(
    UserId,
    "A signed-in user's identifier (Firebase Auth `localId`).\n\nUsed purely as the partition key deciding which customers are visible and writable."
);
string_id_type!(
    CustomerId,
    "A customer identifier (Firestore document ID in `chili_customers`)."
);

/// A purchase identifier (UUID v4, generated when the purchase is recorded).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurchaseId(uuid::Uuid);

impl PurchaseId {
    /// Create a purchase identifier from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random purchase identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for PurchaseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PurchaseId({})", self.0)
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PurchaseId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PurchaseId> for String {
    fn from(id: PurchaseId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty or whitespace.
    #[error("identifier must not be empty")]
    Empty,

    /// The identifier contains a character that cannot appear in a document path.
    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}
