//! Customer storage for ChiliPredict.
//!
//! Customers live in a managed document store (Cloud Firestore), one document
//! per customer in the `chili_customers` collection, with purchases and the
//! cached prediction embedded in the document.
//!
//! # Backends
//!
//! - [`FirestoreStore`]: the Firestore REST API, authenticated with the
//!   signed-in user's Firebase ID token. Security rules on the project enforce
//!   owner scoping server-side.
//! - [`MemoryStore`]: an in-process store with the same owner-scoping rules,
//!   used for tests and local development.
//!
//! # Example
//!
//! ```no_run
//! use chili_core::{NewCustomer, UserId};
//! use chili_store::{AuthContext, MemoryStore, Store};
//!
//! # async fn example() -> chili_store::Result<()> {
//! let store = MemoryStore::new();
//! let auth = AuthContext::new(UserId::new("uid-1").unwrap(), "id-token");
//!
//! let new = NewCustomer::new(auth.user_id.clone(), "Quán Bà Ba").unwrap();
//! let id = store.create_customer(&auth, &new).await?;
//! let customers = store.list_customers(&auth).await?;
//! assert_eq!(customers[0].id, id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod firestore;
pub mod memory;
pub mod paths;
pub mod schema;

pub use error::{Result, StoreError};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use secrecy::SecretString;

use chili_core::{Customer, CustomerId, CustomerUpdate, NewCustomer, UserId};

/// Credentials of the signed-in user a store call is made on behalf of.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The signed-in user; the partition key for every query and write.
    pub user_id: UserId,
    /// Firebase ID token sent to the backend.
    pub id_token: SecretString,
}

impl AuthContext {
    /// Build credentials for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, id_token: impl Into<String>) -> Self {
        Self {
            user_id,
            id_token: SecretString::from(id_token.into()),
        }
    }
}

/// The storage trait for customer documents.
///
/// Every call is scoped to the caller in [`AuthContext`]: queries only return
/// the caller's customers and writes to someone else's customer are rejected.
#[async_trait]
pub trait Store: Send + Sync {
    /// List every customer owned by the caller, in no particular order.
    ///
    /// Ordering is left to the caller so the backend needs no composite index
    /// on owner and creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_customers(&self, auth: &AuthContext) -> Result<Vec<Customer>>;

    /// Create a customer with an empty history and a server-assigned creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or `new.owner` is not the caller.
    async fn create_customer(&self, auth: &AuthContext, new: &NewCustomer) -> Result<CustomerId>;

    /// Apply a partial update to one customer in a single atomic write.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the customer does not exist.
    /// - `StoreError::PermissionDenied` if the caller does not own it.
    /// - `StoreError::Conflict` if the update's expected revision is stale.
    async fn update_customer(
        &self,
        auth: &AuthContext,
        id: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<()>;

    /// Delete a customer together with its embedded purchases and prediction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PermissionDenied` if the caller does not own it.
    async fn delete_customer(&self, auth: &AuthContext, id: &CustomerId) -> Result<()>;
}
