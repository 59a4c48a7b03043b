//! services/api/src/adapters/memory.rs
//!
//! An in-process `KeyValueStore`, used when no database is configured.
//! State does not survive a restart.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use webinar_catalog_core::ports::{KeyValueStore, PortResult};

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> PortResult<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_overwrites_and_list_filters_by_prefix() {
        let store = MemoryKeyValueStore::new();
        store.set("visitor:a:webinar_bookmarks", "[]").await.unwrap();
        store.set("visitor:a:webinar_bookmarks", "[\"1\"]").await.unwrap();
        store.set("visitor:ab:webinar_bookmarks", "[]").await.unwrap();
        store.set("visitor:b:webinar_bookmarks", "[]").await.unwrap();

        assert_eq!(
            store.get("visitor:a:webinar_bookmarks").await.unwrap().as_deref(),
            Some("[\"1\"]")
        );
        assert_eq!(store.get("missing").await.unwrap(), None);

        let listed = store.list("visitor:a:").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "visitor:a:webinar_bookmarks");
    }
}
