//! Keeps each session's mirror in step with the store.
//!
//! The store is re-queried on a fixed interval by one background task per
//! session, and immediately after every successful write. Refreshes for a
//! session are serialized so an older listing never overwrites a newer one.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use chili_core::{CustomerId, CustomerUpdate, NewCustomer, SnapshotOutcome};
use chili_store::{AuthContext, Store, StoreError};

use crate::error::ApiError;
use crate::identity::IdentityClient;
use crate::session::Session;

/// Store access on behalf of sessions.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn Store>,
    identity: Option<Arc<IdentityClient>>,
    interval: Duration,
}

impl SyncEngine {
    /// Create an engine refreshing every `interval`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        identity: Option<Arc<IdentityClient>>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            identity,
            interval,
        }
    }

    async fn auth(&self, session: &Session) -> Result<AuthContext, ApiError> {
        session
            .auth_context(self.identity.as_deref())
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %session.user_id(), error = %e, "ID token refresh failed");
                ApiError::Unauthorized
            })
    }

    /// Re-query the session's customers and replace its mirror.
    ///
    /// A failure is recorded on the session so the dashboard can show it, and
    /// cleared by the next successful refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails; the mirror is left as it was.
    pub async fn refresh(&self, session: &Session) -> Result<SnapshotOutcome, ApiError> {
        let _serial = session.refresh_lock.lock().await;
        let auth = self.auth(session).await?;

        match self.store.list_customers(&auth).await {
            Ok(customers) => {
                let outcome = session.mirror.write().await.apply_snapshot(customers);
                *session.sync_error.write().await = None;
                if outcome.foreign_dropped > 0 {
                    tracing::warn!(
                        user_id = %auth.user_id,
                        dropped = outcome.foreign_dropped,
                        "Dropped customers owned by another user"
                    );
                }
                tracing::debug!(
                    user_id = %auth.user_id,
                    visible = outcome.visible,
                    selection_changed = outcome.selection_changed,
                    "Refreshed customers"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(user_id = %auth.user_id, error = %e, "Customer refresh failed");
                *session.sync_error.write().await = Some(e.guidance());
                Err(e.into())
            }
        }
    }

    /// Start the session's background refresh loop.
    ///
    /// The loop holds only a weak reference and stops once the session is
    /// closed or dropped.
    pub fn start(&self, session: &Arc<Session>) {
        let engine = self.clone();
        let weak: Weak<Session> = Arc::downgrade(session);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; sign-in already refreshed.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(session) = weak.upgrade() else {
                    break;
                };
                // Errors are logged and recorded by `refresh`.
                let _ = engine.refresh(&session).await;
            }
        });

        session.set_sync_task(handle);
    }

    /// Create a customer for the session's user, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the write fails.
    pub async fn create_customer(&self, session: &Session, name: &str) -> Result<CustomerId, ApiError> {
        let new = NewCustomer::new(session.user_id().clone(), name)?;
        let auth = self.auth(session).await?;

        let id = self.store.create_customer(&auth, &new).await.map_err(|e| {
            tracing::warn!(user_id = %auth.user_id, error = %e, "Failed to create customer");
            e
        })?;
        tracing::info!(user_id = %auth.user_id, customer_id = %id, "Customer created");

        self.refresh_after_write(session).await;
        Ok(id)
    }

    /// Apply one update to a customer, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_customer(
        &self,
        session: &Session,
        id: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<(), ApiError> {
        let auth = self.auth(session).await?;

        if let Err(e) = self.store.update_customer(&auth, id, update).await {
            tracing::warn!(user_id = %auth.user_id, customer_id = %id, error = %e, "Failed to update customer");
            // The mirror is behind the store; catch up so a retry sees the
            // current document.
            if matches!(e, StoreError::Conflict(_)) {
                self.refresh_after_write(session).await;
            }
            return Err(e.into());
        }

        self.refresh_after_write(session).await;
        Ok(())
    }

    /// Delete a customer, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn delete_customer(&self, session: &Session, id: &CustomerId) -> Result<(), ApiError> {
        let auth = self.auth(session).await?;

        self.store.delete_customer(&auth, id).await.map_err(|e| {
            tracing::warn!(user_id = %auth.user_id, customer_id = %id, error = %e, "Failed to delete customer");
            e
        })?;
        tracing::info!(user_id = %auth.user_id, customer_id = %id, "Customer deleted");

        self.refresh_after_write(session).await;
        Ok(())
    }

    /// The write already succeeded; a failed refresh only leaves the mirror
    /// stale until the next tick.
    async fn refresh_after_write(&self, session: &Session) {
        let _ = self.refresh(session).await;
    }
}
