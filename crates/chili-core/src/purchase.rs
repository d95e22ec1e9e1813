//! Purchases embedded in a customer's history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ChiliError, Result};
use crate::ids::PurchaseId;

/// A single recorded purchase.
///
/// Purchases only exist inside a [`Customer`](crate::Customer)'s purchase list.
/// Dates have day granularity and serialize as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase identifier.
    pub id: PurchaseId,

    /// Calendar day of the purchase.
    pub date: NaiveDate,

    /// Quantity bought (liters / bottles), always at least 1.
    pub quantity: u32,
}

impl Purchase {
    /// Record a new purchase with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::InvalidQuantity` if `quantity` is zero.
    pub fn new(date: NaiveDate, quantity: u32) -> Result<Self> {
        validate_quantity(quantity)?;
        Ok(Self {
            id: PurchaseId::generate(),
            date,
            quantity,
        })
    }
}

/// Partial change to an existing purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEdit {
    /// New date, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// New quantity, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl PurchaseEdit {
    /// Apply this edit to a purchase in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit is empty or the new quantity is zero.
    pub fn apply(&self, purchase: &mut Purchase) -> Result<()> {
        if self.date.is_none() && self.quantity.is_none() {
            return Err(ChiliError::EmptyEdit);
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
            purchase.quantity = quantity;
        }
        if let Some(date) = self.date {
            purchase.date = date;
        }
        Ok(())
    }
}

/// Sort purchases by date ascending.
///
/// The sort is stable: purchases on the same day keep their relative order.
pub fn sort_by_date(purchases: &mut [Purchase]) {
    purchases.sort_by_key(|p| p.date);
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(ChiliError::InvalidQuantity(quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn new_purchase_rejects_zero_quantity() {
        assert_eq!(
            Purchase::new(day("2024-01-05"), 0),
            Err(ChiliError::InvalidQuantity(0))
        );
    }

    #[test]
    fn purchase_serializes_date_as_iso_day() {
        let purchase = Purchase::new(day("2024-01-05"), 10).unwrap();
        let json = serde_json::to_value(&purchase).unwrap();
        assert_eq!(json["date"], "2024-01-05");
        assert_eq!(json["quantity"], 10);
    }

    #[test]
    fn sort_is_stable_for_same_day() {
        let a = Purchase::new(day("2024-02-01"), 1).unwrap();
        let b = Purchase::new(day("2024-01-01"), 2).unwrap();
        let c = Purchase::new(day("2024-02-01"), 3).unwrap();
        let mut list = vec![a.clone(), b.clone(), c.clone()];

        sort_by_date(&mut list);

        assert_eq!(list, vec![b, a, c]);
    }

    #[test]
    fn empty_edit_is_rejected() {
        let mut purchase = Purchase::new(day("2024-01-05"), 10).unwrap();
        assert_eq!(
            PurchaseEdit::default().apply(&mut purchase),
            Err(ChiliError::EmptyEdit)
        );
    }

    #[test]
    fn edit_with_zero_quantity_leaves_purchase_untouched() {
        let mut purchase = Purchase::new(day("2024-01-05"), 10).unwrap();
        let edit = PurchaseEdit {
            date: Some(day("2024-03-01")),
            quantity: Some(0),
        };

        assert!(edit.apply(&mut purchase).is_err());
        assert_eq!(purchase.date, day("2024-01-05"));
        assert_eq!(purchase.quantity, 10);
    }
}
