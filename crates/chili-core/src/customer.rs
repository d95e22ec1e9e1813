//! Customer records and the updates that may be applied to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChiliError, Result};
use crate::ids::{CustomerId, PurchaseId, UserId};
use crate::prediction::Prediction;
use crate::purchase::{sort_by_date, Purchase, PurchaseEdit};

/// Minimum number of purchases before a forecast may be requested.
pub const MIN_PURCHASES_FOR_PREDICTION: usize = 2;

/// Server-side revision of a customer document (its last update time).
///
/// Used as a write precondition so a purchase list or forecast is only
/// written if the document has not changed since it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(pub DateTime<Utc>);

/// A customer owned by one signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier.
    pub id: CustomerId,

    /// The user who owns this record.
    pub owner: UserId,

    /// Display name.
    pub name: String,

    /// Purchase history, kept in ascending date order.
    pub purchases: Vec<Purchase>,

    /// Cached forecast for exactly this purchase history, if any.
    pub prediction: Option<Prediction>,

    /// Server-assigned creation time. `None` while the server timestamp is pending.
    pub created_at: Option<DateTime<Utc>>,

    /// Last server revision, if known.
    pub revision: Option<Revision>,
}

impl Customer {
    /// Find a purchase by ID.
    #[must_use]
    pub fn purchase(&self, purchase_id: &PurchaseId) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id == *purchase_id)
    }

    /// Whether enough history exists to request a forecast.
    #[must_use]
    pub fn can_predict(&self) -> bool {
        self.purchases.len() >= MIN_PURCHASES_FOR_PREDICTION
    }

    /// Check the minimum-history precondition for forecasting.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::InsufficientHistory` with fewer than
    /// [`MIN_PURCHASES_FOR_PREDICTION`] purchases.
    pub fn ensure_predictable(&self) -> Result<()> {
        if self.can_predict() {
            Ok(())
        } else {
            Err(ChiliError::InsufficientHistory {
                actual: self.purchases.len(),
                required: MIN_PURCHASES_FOR_PREDICTION,
            })
        }
    }

    /// Build the update that records a new purchase.
    ///
    /// Returns the new purchase alongside the update.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is zero.
    pub fn add_purchase(&self, date: NaiveDate, quantity: u32) -> Result<(Purchase, CustomerUpdate)> {
        let purchase = Purchase::new(date, quantity)?;
        let mut purchases = self.purchases.clone();
        purchases.push(purchase.clone());
        Ok((purchase, CustomerUpdate::replace_purchases(purchases, self.revision)))
    }

    /// Build the update that edits an existing purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase does not exist or the edit is invalid.
    pub fn edit_purchase(&self, purchase_id: &PurchaseId, edit: &PurchaseEdit) -> Result<CustomerUpdate> {
        let mut purchases = self.purchases.clone();
        let target = purchases
            .iter_mut()
            .find(|p| p.id == *purchase_id)
            .ok_or_else(|| ChiliError::PurchaseNotFound {
                purchase_id: purchase_id.to_string(),
            })?;
        edit.apply(target)?;
        Ok(CustomerUpdate::replace_purchases(purchases, self.revision))
    }

    /// Build the update that removes a purchase.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::PurchaseNotFound` if the purchase does not exist.
    pub fn remove_purchase(&self, purchase_id: &PurchaseId) -> Result<CustomerUpdate> {
        let before = self.purchases.len();
        let purchases: Vec<Purchase> = self
            .purchases
            .iter()
            .filter(|p| p.id != *purchase_id)
            .cloned()
            .collect();
        if purchases.len() == before {
            return Err(ChiliError::PurchaseNotFound {
                purchase_id: purchase_id.to_string(),
            });
        }
        Ok(CustomerUpdate::replace_purchases(purchases, self.revision))
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// The owning user.
    pub owner: UserId,
    /// Trimmed, non-empty display name.
    pub name: String,
}

impl NewCustomer {
    /// Validate a new customer for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::EmptyName` if the name is blank.
    pub fn new(owner: UserId, name: &str) -> Result<Self> {
        Ok(Self {
            owner,
            name: normalize_name(name)?,
        })
    }
}

/// A partial update to one customer document.
///
/// Fields are private: the only way to change the purchase list is through
/// constructors that also clear the cached prediction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerUpdate {
    name: Option<String>,
    purchases: Option<Vec<Purchase>>,
    prediction: Option<Option<Prediction>>,
    expected_revision: Option<Revision>,
}

impl CustomerUpdate {
    /// Rename a customer.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::EmptyName` if the name is blank.
    pub fn rename(name: &str) -> Result<Self> {
        Ok(Self {
            name: Some(normalize_name(name)?),
            ..Self::default()
        })
    }

    /// Replace the purchase list and clear the prediction in the same update.
    ///
    /// The list is re-sorted by date. The list was built from the document at
    /// `revision`, so the write only applies if it is still there.
    #[must_use]
    pub fn replace_purchases(mut purchases: Vec<Purchase>, revision: Option<Revision>) -> Self {
        sort_by_date(&mut purchases);
        Self {
            purchases: Some(purchases),
            prediction: Some(None),
            expected_revision: revision,
            ..Self::default()
        }
    }

    /// Store a forecast, conditional on the document still being at `revision`.
    #[must_use]
    pub fn store_prediction(prediction: Prediction, revision: Option<Revision>) -> Self {
        Self {
            prediction: Some(Some(prediction)),
            expected_revision: revision,
            ..Self::default()
        }
    }

    /// New name, if renaming.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// New purchase list, if rewriting it.
    #[must_use]
    pub fn purchases(&self) -> Option<&[Purchase]> {
        self.purchases.as_deref()
    }

    /// New prediction value (`Some(None)` clears it), if touching it.
    #[must_use]
    pub fn prediction(&self) -> Option<Option<&Prediction>> {
        self.prediction.as_ref().map(Option::as_ref)
    }

    /// Revision the document must still be at for the update to apply.
    #[must_use]
    pub fn expected_revision(&self) -> Option<Revision> {
        self.expected_revision
    }

    /// Document field paths touched by this update.
    #[must_use]
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.name.is_some() {
            paths.push("name");
        }
        if self.purchases.is_some() {
            paths.push("purchases");
        }
        if self.prediction.is_some() {
            paths.push("prediction");
        }
        paths
    }

    /// Apply the update to a local copy of the customer.
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name.clone_from(name);
        }
        if let Some(purchases) = &self.purchases {
            customer.purchases.clone_from(purchases);
        }
        if let Some(prediction) = &self.prediction {
            customer.prediction.clone_from(prediction);
        }
    }
}

/// Sort customers newest first by creation time.
///
/// Customers whose server timestamp is still pending sort as if created at the
/// epoch, i.e. last. The sort is stable.
pub fn sort_newest_first(customers: &mut [Customer]) {
    customers.sort_by(|a, b| created_key(b).cmp(&created_key(a)));
}

fn created_key(customer: &Customer) -> i64 {
    customer.created_at.map_or(0, |t| t.timestamp())
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ChiliError::EmptyName);
    }
    Ok(trimmed.to_string())
}
