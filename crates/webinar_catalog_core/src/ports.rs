//! crates/webinar_catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! engine independent of where webinars come from and where visitor state is
//! persisted.

use crate::domain::Webinar;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Supplies the full webinar collection in canonical shape.
#[async_trait]
pub trait WebinarRepository: Send + Sync {
    async fn fetch_webinars(&self) -> PortResult<Vec<Webinar>>;
}

/// A string key-value capability used for visitor state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Lists every `(key, value)` pair whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> PortResult<Vec<(String, String)>>;
}

//=========================================================================================
// Scoped Store
//=========================================================================================

/// Namespaces every key of an inner store under a fixed prefix, so several
/// visitors can share one backing store.
pub struct ScopedStore<'a> {
    inner: &'a dyn KeyValueStore,
    prefix: String,
}

impl<'a> ScopedStore<'a> {
    pub fn new(inner: &'a dyn KeyValueStore, scope: impl std::fmt::Display) -> Self {
        Self { inner, prefix: format!("{scope}:") }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for ScopedStore<'_> {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn list(&self, prefix: &str) -> PortResult<Vec<(String, String)>> {
        let entries = self.inner.list(&self.scoped(prefix)).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&self.prefix).map(|k| (k.to_string(), value))
            })
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TestStore;
    use super::*;

    #[tokio::test]
    async fn scoped_store_isolates_visitors() {
        let backing = TestStore::default();
        let alice = ScopedStore::new(&backing, "visitor:alice");
        let bob = ScopedStore::new(&backing, "visitor:bob");

        alice.set("webinar_bookmarks", "[\"1\"]").await.unwrap();
        alice.set("webinar_access_intro", "true").await.unwrap();

        assert_eq!(bob.get("webinar_bookmarks").await.unwrap(), None);
        assert_eq!(
            backing.raw("visitor:alice:webinar_bookmarks").as_deref(),
            Some("[\"1\"]")
        );
        let listed = alice.list("webinar_").await.unwrap();
        assert_eq!(
            listed,
            vec![
                ("webinar_access_intro".to_string(), "true".to_string()),
                ("webinar_bookmarks".to_string(), "[\"1\"]".to_string()),
            ]
        );
        assert!(bob.list("").await.unwrap().is_empty());
    }
}
