//! The local, owner-scoped view of a user's customers.
//!
//! A [`Mirror`] is replaced wholesale on every snapshot from the store. It keeps
//! the selected customer across snapshots unless that customer disappears.

use crate::customer::{sort_newest_first, Customer};
use crate::error::{ChiliError, Result};
use crate::ids::{CustomerId, UserId};

/// What changed when a snapshot was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Number of customers now visible.
    pub visible: usize,
    /// Records dropped because they belong to another owner.
    pub foreign_dropped: usize,
    /// Whether the selected customer changed.
    pub selection_changed: bool,
}

/// Local mirror of one user's customers.
#[derive(Debug, Clone)]
pub struct Mirror {
    owner: UserId,
    customers: Vec<Customer>,
    selected: Option<CustomerId>,
}

impl Mirror {
    /// Create an empty mirror for `owner`.
    #[must_use]
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            customers: Vec::new(),
            selected: None,
        }
    }

    /// The user this mirror belongs to.
    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// All visible customers, newest first.
    #[must_use]
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Whether no customers are visible (the empty state).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// The selected customer ID, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&CustomerId> {
        self.selected.as_ref()
    }

    /// The selected customer, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Customer> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Look up a visible customer.
    #[must_use]
    pub fn get(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == *id)
    }

    /// Look up a visible customer or fail.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::CustomerNotFound` if the customer is not visible.
    pub fn require(&self, id: &CustomerId) -> Result<&Customer> {
        self.get(id).ok_or_else(|| ChiliError::CustomerNotFound {
            customer_id: id.to_string(),
        })
    }

    /// Customers whose name contains `query`, case-insensitively.
    ///
    /// An empty or blank query matches everyone.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Customer> + 'a {
        let needle = query.trim().to_lowercase();
        self.customers
            .iter()
            .filter(move |c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
    }

    /// Select a visible customer.
    ///
    /// # Errors
    ///
    /// Returns `ChiliError::CustomerNotFound` if the customer is not visible.
    pub fn select(&mut self, id: &CustomerId) -> Result<()> {
        self.require(id)?;
        self.selected = Some(id.clone());
        Ok(())
    }

    /// Replace the collection with a new snapshot.
    ///
    /// Records owned by someone else are dropped, the rest are sorted newest
    /// first. The current selection is kept if still present; otherwise the
    /// newest customer is selected, or nothing when the snapshot is empty.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Customer>) -> SnapshotOutcome {
        let total = snapshot.len();
        let mut customers: Vec<Customer> = snapshot
            .into_iter()
            .filter(|c| c.owner == self.owner)
            .collect();
        let foreign_dropped = total - customers.len();
        sort_newest_first(&mut customers);

        let previous = self.selected.take();
        let still_present = previous
            .as_ref()
            .is_some_and(|id| customers.iter().any(|c| c.id == *id));
        self.selected = if still_present {
            previous.clone()
        } else {
            customers.first().map(|c| c.id.clone())
        };
        self.customers = customers;

        SnapshotOutcome {
            visible: self.customers.len(),
            foreign_dropped,
            selection_changed: previous != self.selected,
        }
    }

    /// Drop everything (sign-out).
    pub fn clear(&mut self) {
        self.customers.clear();
        self.selected = None;
    }
}
