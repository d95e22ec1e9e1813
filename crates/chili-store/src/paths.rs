//! Document path and identifier helpers.

use chili_core::CustomerId;

use crate::schema::CUSTOMERS_COLLECTION;

/// Length of auto-generated document IDs.
pub const AUTO_ID_LEN: usize = 20;

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Root of the default database's documents for `project_id`.
#[must_use]
pub fn documents_root(project_id: &str) -> String {
    format!("projects/{project_id}/databases/(default)/documents")
}

/// Full resource name of a customer document.
#[must_use]
pub fn customer_document(project_id: &str, id: &CustomerId) -> String {
    format!("{}/{CUSTOMERS_COLLECTION}/{id}", documents_root(project_id))
}

/// Extract the customer ID (last path segment) from a document resource name.
#[must_use]
pub fn customer_id_from_name(name: &str) -> Option<CustomerId> {
    let (collection_path, id) = name.rsplit_once('/')?;
    if !collection_path.ends_with(CUSTOMERS_COLLECTION) {
        return None;
    }
    CustomerId::new(id).ok()
}

/// Generate a random 20-character alphanumeric document ID, like the Firestore SDKs do.
#[must_use]
pub fn auto_id() -> CustomerId {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());

    let id: String = bytes
        .iter()
        .take(AUTO_ID_LEN)
        .map(|b| char::from(AUTO_ID_ALPHABET[usize::from(*b) % AUTO_ID_ALPHABET.len()]))
        .collect();

    // Alphanumeric and non-empty, so always a valid ID.
    CustomerId::new(id).unwrap_or_else(|_| unreachable!("auto ids are alphanumeric"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_name_roundtrip() {
        let id = CustomerId::new("AbC123").unwrap();
        let name = customer_document("demo", &id);

        assert_eq!(
            name,
            "projects/demo/databases/(default)/documents/chili_customers/AbC123"
        );
        assert_eq!(customer_id_from_name(&name), Some(id));
    }

    #[test]
    fn foreign_collection_is_rejected() {
        assert!(customer_id_from_name("projects/demo/databases/(default)/documents/other/x").is_none());
    }

    #[test]
    fn auto_ids_are_alphanumeric_and_distinct() {
        let a = auto_id();
        let b = auto_id();

        assert_eq!(a.as_str().len(), AUTO_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
