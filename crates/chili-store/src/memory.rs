//! In-memory storage backend.
//!
//! Mirrors the owner-scoping rules the Firestore security rules enforce, so code
//! exercised against it behaves the same against the real backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use chili_core::{Customer, CustomerId, CustomerUpdate, NewCustomer, Revision};

use crate::error::{Result, StoreError};
use crate::paths::auto_id;
use crate::{AuthContext, Store};

#[derive(Default)]
struct Inner {
    customers: HashMap<CustomerId, Customer>,
    last_write: Option<DateTime<Utc>>,
    fail_next: Option<StoreError>,
}

impl Inner {
    /// A write timestamp strictly greater than the previous one, so revisions
    /// always change on write.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_write {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_write = Some(next);
        next
    }

    fn take_failure(&mut self) -> Result<()> {
        self.fail_next.take().map_or(Ok(()), Err)
    }
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        self.lock().fail_next = Some(err);
    }

    /// Number of documents across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().customers.len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a document regardless of owner.
    #[must_use]
    pub fn get(&self, id: &CustomerId) -> Option<Customer> {
        self.lock().customers.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_customers(&self, auth: &AuthContext) -> Result<Vec<Customer>> {
        let mut inner = self.lock();
        inner.take_failure()?;

        Ok(inner
            .customers
            .values()
            .filter(|c| c.owner == auth.user_id)
            .cloned()
            .collect())
    }

    async fn create_customer(&self, auth: &AuthContext, new: &NewCustomer) -> Result<CustomerId> {
        let mut inner = self.lock();
        inner.take_failure()?;

        if new.owner != auth.user_id {
            return Err(StoreError::PermissionDenied(
                "cannot create a customer for another user".into(),
            ));
        }

        let id = auto_id();
        let now = inner.tick();
        inner.customers.insert(
            id.clone(),
            Customer {
                id: id.clone(),
                owner: new.owner.clone(),
                name: new.name.clone(),
                purchases: Vec::new(),
                prediction: None,
                created_at: Some(now),
                revision: Some(Revision(now)),
            },
        );
        Ok(id)
    }

    async fn update_customer(
        &self,
        auth: &AuthContext,
        id: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.take_failure()?;

        let current = inner
            .customers
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if current.owner != auth.user_id {
            return Err(StoreError::PermissionDenied(format!(
                "customer {id} belongs to another user"
            )));
        }
        if let Some(expected) = update.expected_revision() {
            if current.revision != Some(expected) {
                return Err(StoreError::Conflict(format!(
                    "customer {id} was modified since revision {}",
                    expected.0.to_rfc3339()
                )));
            }
        }

        let now = inner.tick();
        if let Some(customer) = inner.customers.get_mut(id) {
            update.apply_to(customer);
            customer.revision = Some(Revision(now));
        }
        Ok(())
    }

    async fn delete_customer(&self, auth: &AuthContext, id: &CustomerId) -> Result<()> {
        let mut inner = self.lock();
        inner.take_failure()?;

        match inner.customers.get(id) {
            Some(c) if c.owner != auth.user_id => Err(StoreError::PermissionDenied(format!(
                "customer {id} belongs to another user"
            ))),
            Some(_) => {
                inner.customers.remove(id);
                Ok(())
            }
            // Deleting a missing document is not an error, as in Firestore.
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chili_core::{Prediction, UserId};

    fn auth(uid: &str) -> AuthContext {
        AuthContext::new(UserId::new(uid).unwrap(), format!("token-{uid}"))
    }

    async fn create(store: &MemoryStore, uid: &str, name: &str) -> CustomerId {
        let a = auth(uid);
        let new = NewCustomer::new(a.user_id.clone(), name).unwrap();
        store.create_customer(&a, &new).await.unwrap()
    }

    #[tokio::test]
    async fn same_name_different_owners_are_isolated() {
        let store = MemoryStore::new();
        create(&store, "alice", "Tiệm Tư").await;
        create(&store, "bob", "Tiệm Tư").await;

        let alice = store.list_customers(&auth("alice")).await.unwrap();
        let bob = store.list_customers(&auth("bob")).await.unwrap();

        assert_eq!(alice.len(), 1);
        assert_eq!(bob.len(), 1);
        assert_eq!(alice[0].owner.as_str(), "alice");
        assert_eq!(bob[0].owner.as_str(), "bob");
        assert_ne!(alice[0].id, bob[0].id);
    }

    #[tokio::test]
    async fn writes_to_foreign_customer_are_denied() {
        let store = MemoryStore::new();
        let id = create(&store, "alice", "An").await;

        let rename = CustomerUpdate::rename("Hijacked").unwrap();
        let err = store
            .update_customer(&auth("bob"), &id, &rename)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));

        let err = store.delete_customer(&auth("bob"), &id).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));
        assert_eq!(store.get(&id).unwrap().name, "An");
    }

    #[tokio::test]
    async fn create_for_other_owner_is_denied() {
        let store = MemoryStore::new();
        let new = NewCustomer::new(UserId::new("bob").unwrap(), "An").unwrap();

        let err = store.create_customer(&auth("alice"), &new).await.unwrap_err();

        assert!(matches!(err, StoreError::PermissionDenied(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let store = MemoryStore::new();
        let a = auth("alice");
        let id = create(&store, "alice", "An").await;
        let read = store.get(&id).unwrap();

        let (_, add) = read
            .add_purchase("2024-01-05".parse().unwrap(), 10)
            .unwrap();
        store.update_customer(&a, &id, &add).await.unwrap();

        let prediction = Prediction {
            next_purchase_date: "2024-02-01".parse().unwrap(),
            expected_quantity: 10.0,
            reasoning: "x".into(),
        };
        let stale = CustomerUpdate::store_prediction(prediction, read.revision);
        let err = store.update_customer(&a, &id, &stale).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get(&id).unwrap().prediction.is_none());
    }

    #[tokio::test]
    async fn revision_advances_on_every_write() {
        let store = MemoryStore::new();
        let a = auth("alice");
        let id = create(&store, "alice", "An").await;
        let before = store.get(&id).unwrap().revision.unwrap();

        store
            .update_customer(&a, &id, &CustomerUpdate::rename("Ân").unwrap())
            .await
            .unwrap();

        assert!(store.get(&id).unwrap().revision.unwrap() > before);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreError::MissingIndex("needs index".into()));

        assert!(store.list_customers(&auth("alice")).await.is_err());
        assert!(store.list_customers(&auth("alice")).await.is_ok());
    }

    #[tokio::test]
    async fn update_missing_customer_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_customer(
                &auth("alice"),
                &CustomerId::new("missing").unwrap(),
                &CustomerUpdate::rename("x").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
