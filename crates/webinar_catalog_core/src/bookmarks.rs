//! crates/webinar_catalog_core/src/bookmarks.rs
//!
//! A visitor's bookmarked webinar ids, persisted through a `KeyValueStore`.
//!
//! Persistence problems never surface to the caller: unreadable state loads as
//! an empty set and a failed save keeps the in-memory membership.

use crate::domain::Webinar;
use crate::ports::KeyValueStore;
use tracing::warn;

/// The storage key holding the JSON array of bookmarked ids.
pub const BOOKMARKS_KEY: &str = "webinar_bookmarks";

pub struct BookmarkSet<'a> {
    store: &'a dyn KeyValueStore,
    ids: Vec<String>,
}

impl<'a> BookmarkSet<'a> {
    /// Loads the persisted set. Missing or corrupt state yields an empty set.
    pub async fn load(store: &'a dyn KeyValueStore) -> Self {
        let ids = match store.get(BOOKMARKS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt bookmark state: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load bookmarks, starting empty: {:?}", e);
                Vec::new()
            }
        };
        Self { store, ids }
    }

    /// Flips membership of `id`, persists the set and returns the new membership.
    pub async fn toggle(&mut self, id: &str) -> bool {
        let now_bookmarked = match self.ids.iter().position(|b| b == id) {
            Some(pos) => {
                self.ids.remove(pos);
                false
            }
            None => {
                self.ids.push(id.to_string());
                true
            }
        };
        self.save().await;
        now_bookmarked
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        !id.is_empty() && self.ids.iter().any(|b| b == id)
    }

    /// The bookmarked subset of `collection`, in collection order.
    pub fn filter_bookmarked(&self, collection: &[Webinar]) -> Vec<Webinar> {
        collection
            .iter()
            .filter(|w| self.is_bookmarked(&w.id))
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    async fn save(&self) {
        let encoded = match serde_json::to_string(&self.ids) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode bookmarks: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(BOOKMARKS_KEY, &encoded).await {
            warn!("Failed to persist bookmarks: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::testing::TestStore;

    fn webinar(id: &str) -> Webinar {
        Webinar { id: id.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn toggling_twice_restores_membership_and_persisted_value() {
        let store = TestStore::with(BOOKMARKS_KEY, r#"["a"]"#);
        let mut bookmarks = BookmarkSet::load(&store).await;

        assert!(bookmarks.toggle("b").await);
        assert!(bookmarks.is_bookmarked("b"));
        assert_eq!(store.raw(BOOKMARKS_KEY).as_deref(), Some(r#"["a","b"]"#));

        assert!(!bookmarks.toggle("b").await);
        assert!(!bookmarks.is_bookmarked("b"));
        assert_eq!(bookmarks.ids(), ["a"]);
        assert_eq!(store.raw(BOOKMARKS_KEY).as_deref(), Some(r#"["a"]"#));
    }

    #[tokio::test]
    async fn corrupt_or_missing_state_loads_empty() {
        let store = TestStore::with(BOOKMARKS_KEY, "{not json");
        assert!(BookmarkSet::load(&store).await.ids().is_empty());

        let store = TestStore::default();
        assert!(BookmarkSet::load(&store).await.ids().is_empty());

        let store = TestStore::with(BOOKMARKS_KEY, r#"["a"]"#);
        store.set_failing(true);
        assert!(BookmarkSet::load(&store).await.ids().is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_in_memory_state() {
        let store = TestStore::default();
        let mut bookmarks = BookmarkSet::load(&store).await;
        store.set_failing(true);
        assert!(bookmarks.toggle("x").await);
        assert!(bookmarks.is_bookmarked("x"));
        assert_eq!(store.raw(BOOKMARKS_KEY), None);
    }

    #[tokio::test]
    async fn filters_collection_in_collection_order() {
        let store = TestStore::with(BOOKMARKS_KEY, r#"["c","a"]"#);
        let bookmarks = BookmarkSet::load(&store).await;
        let collection = vec![webinar("a"), webinar("b"), webinar("c")];
        let kept: Vec<_> = bookmarks
            .filter_bookmarked(&collection)
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(kept, ["a", "c"]);
        assert!(!bookmarks.is_bookmarked(""));
        assert!(!bookmarks.is_bookmarked("zzz"));
    }
}
