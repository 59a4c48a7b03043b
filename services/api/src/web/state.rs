//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::web::middleware::VisitorId;
use crate::web::protocol::{ClientMessage, ServerMessage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use webinar_catalog_core::{
    filter::{filter_webinars_at, FilterState},
    pagination::{paginate, DEFAULT_PAGE_SIZE},
    ports::KeyValueStore,
    ranking::rank_webinars,
    WebinarType,
};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
    pub visitor_locks: Arc<VisitorLocks>,
}

/// Serializes read-modify-write sequences on one visitor's persisted state.
///
/// This holds within one process only; several instances sharing a database
/// can still interleave.
#[derive(Default)]
pub struct VisitorLocks {
    locks: StdMutex<HashMap<VisitorId, Arc<Mutex<()>>>>,
}

impl VisitorLocks {
    /// Waits until no other request holds this visitor's lock.
    pub async fn lock(&self, visitor: VisitorId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Locks nobody holds or waits on are dropped.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(visitor).or_default().clone()
        };
        lock.lock_owned().await
    }
}

//=========================================================================================
// BrowseSession (Specific to One WebSocket Connection)
//=========================================================================================

/// How a browse session should react to an applied change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Recompute and send results right away.
    Immediate,
    /// Recompute after the search quiet period, unless superseded.
    Debounced,
}

/// The tab, filters and page of one connected visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseSession {
    pub tab: WebinarType,
    pub filters: FilterState,
    /// 1-indexed.
    pub page: usize,
    /// Bumped by every applied change.
    pub revision: u64,
}

impl Default for BrowseSession {
    fn default() -> Self {
        Self {
            tab: WebinarType::All,
            filters: FilterState::default(),
            page: 1,
            revision: 0,
        }
    }
}

impl BrowseSession {
    /// Applies a client change. Anything but a page change resets to page 1.
    pub fn apply(&mut self, message: ClientMessage) -> Refresh {
        self.revision = self.revision.wrapping_add(1);
        let refresh = match message {
            ClientMessage::SetPage { page } => {
                self.page = page.max(1);
                return Refresh::Immediate;
            }
            ClientMessage::SetSearch { search } => {
                self.filters.set_search(search);
                Refresh::Debounced
            }
            ClientMessage::SetTab { tab } => {
                self.tab = tab;
                Refresh::Immediate
            }
            ClientMessage::ToggleFilter { facet, value } => {
                self.filters.toggle(facet, &value);
                Refresh::Immediate
            }
            ClientMessage::SelectCategory { category } => {
                self.filters.select_category(category.as_deref());
                Refresh::Immediate
            }
            ClientMessage::SetDateRange { date_range } => {
                self.filters.set_date_range(date_range);
                Refresh::Immediate
            }
            ClientMessage::ClearFilters => {
                self.filters.clear();
                Refresh::Immediate
            }
        };
        self.page = 1;
        refresh
    }

    /// Results for work scheduled at `revision`, or `None` if a later change
    /// has been applied since.
    pub fn results_if_current(
        &mut self,
        revision: u64,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Option<ServerMessage> {
        (self.revision == revision).then(|| self.results(catalog, now))
    }

    /// Computes the current results, clamping the page into range.
    pub fn results(&mut self, catalog: &Catalog, now: DateTime<Utc>) -> ServerMessage {
        let filtered = filter_webinars_at(catalog.webinars(), self.tab, &self.filters, now);
        let ranked = rank_webinars(&filtered);
        let total_pages = ranked.len().div_ceil(DEFAULT_PAGE_SIZE);
        self.page = self.page.clamp(1, total_pages.max(1));
        let page = paginate(&ranked, self.page, DEFAULT_PAGE_SIZE);

        ServerMessage::Results {
            tab: self.tab,
            filters: self.filters.clone(),
            active_filter_count: self.filters.active_filter_count(),
            items: page.items,
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;
    use webinar_catalog_core::{domain::Webinar, FacetKind};

    fn catalog(n: usize) -> Catalog {
        Catalog::new(
            (0..n)
                .map(|i| Webinar {
                    id: i.to_string(),
                    topics: vec![if i % 2 == 0 { "Even" } else { "Odd" }.to_string()],
                    kind: if i < 5 { WebinarType::Upcoming } else { WebinarType::Past },
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn visitor_lock_blocks_only_the_same_visitor() {
        let locks = VisitorLocks::default();
        let alice = VisitorId(Uuid::new_v4());
        let bob = VisitorId(Uuid::new_v4());
        let wait = Duration::from_millis(50);

        let held = locks.lock(alice).await;
        assert!(timeout(wait, locks.lock(alice)).await.is_err());
        assert!(timeout(wait, locks.lock(bob)).await.is_ok());

        drop(held);
        assert!(timeout(wait, locks.lock(alice)).await.is_ok());
    }

    #[test]
    fn changes_reset_the_page_but_paging_does_not() {
        let mut session = BrowseSession::default();
        assert_eq!(session.apply(ClientMessage::SetPage { page: 3 }), Refresh::Immediate);
        assert_eq!(session.page, 3);

        let refresh = session.apply(ClientMessage::ToggleFilter {
            facet: FacetKind::Topic,
            value: "Even".to_string(),
        });
        assert_eq!(refresh, Refresh::Immediate);
        assert_eq!(session.page, 1);

        session.apply(ClientMessage::SetPage { page: 2 });
        assert_eq!(
            session.apply(ClientMessage::SetSearch { search: "x".to_string() }),
            Refresh::Debounced
        );
        assert_eq!(session.page, 1);

        session.apply(ClientMessage::SetPage { page: 2 });
        session.apply(ClientMessage::SetTab { tab: WebinarType::Past });
        assert_eq!(session.page, 1);
    }

    #[test]
    fn clear_filters_restores_defaults_but_keeps_the_tab() {
        let mut session = BrowseSession::default();
        session.apply(ClientMessage::SetTab { tab: WebinarType::Upcoming });
        session.apply(ClientMessage::SetDateRange { date_range: "30".to_string() });
        session.apply(ClientMessage::SelectCategory { category: Some("Learn".to_string()) });
        session.apply(ClientMessage::ClearFilters);
        assert_eq!(session.filters, FilterState::default());
        assert_eq!(session.tab, WebinarType::Upcoming);
    }

    #[test]
    fn superseded_revision_yields_no_results() {
        let catalog = catalog(4);
        let mut session = BrowseSession::default();
        session.apply(ClientMessage::SetSearch { search: "o".to_string() });
        let scheduled = session.revision;
        assert!(session.results_if_current(scheduled, &catalog, Utc::now()).is_some());

        session.apply(ClientMessage::SetTab { tab: WebinarType::Past });
        assert!(session.results_if_current(scheduled, &catalog, Utc::now()).is_none());
        assert!(session
            .results_if_current(session.revision, &catalog, Utc::now())
            .is_some());
    }

    #[test]
    fn results_clamp_out_of_range_pages() {
        let catalog = catalog(20);
        let mut session = BrowseSession::default();
        session.apply(ClientMessage::SetPage { page: 10 });

        match session.results(&catalog, Utc::now()) {
            ServerMessage::Results { page, total_pages, items, total_items, .. } => {
                assert_eq!(page, 3);
                assert_eq!(total_pages, 3);
                assert_eq!(items.len(), 2);
                assert_eq!(total_items, 20);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(session.page, 3);
    }

    #[test]
    fn results_follow_tab_and_filters() {
        let catalog = catalog(10);
        let mut session = BrowseSession::default();
        session.apply(ClientMessage::SetTab { tab: WebinarType::Upcoming });
        session.apply(ClientMessage::ToggleFilter {
            facet: FacetKind::Topic,
            value: "Odd".to_string(),
        });

        match session.results(&catalog, Utc::now()) {
            ServerMessage::Results { items, active_filter_count, .. } => {
                let ids: Vec<_> = items.iter().map(|w| w.id.as_str()).collect();
                assert_eq!(ids, ["1", "3"]);
                assert_eq!(active_filter_count, 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
