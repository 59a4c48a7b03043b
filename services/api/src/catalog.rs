//! services/api/src/catalog.rs
//!
//! The immutable webinar snapshot shared by every handler, loaded once at
//! startup.

use chrono::{DateTime, Utc};
use tracing::{error, info};
use webinar_catalog_core::{
    domain::{Webinar, WebinarType},
    facets::{extract_facets, Facets},
    filter::{filter_webinars_at, FilterState},
    pagination::{paginate, Page},
    ports::WebinarRepository,
    ranking::rank_webinars,
};

pub struct Catalog {
    webinars: Vec<Webinar>,
    facets: Facets,
}

impl Catalog {
    pub fn new(webinars: Vec<Webinar>) -> Self {
        let facets = extract_facets(&webinars);
        Self { webinars, facets }
    }

    /// Performs the one-shot load. A failed load is logged and yields an
    /// empty catalog; there is no retry.
    pub async fn load(repository: &dyn WebinarRepository) -> Self {
        match repository.fetch_webinars().await {
            Ok(webinars) => {
                info!("Catalog loaded with {} webinars", webinars.len());
                Self::new(webinars)
            }
            Err(e) => {
                error!("Failed to load webinars, serving an empty catalog: {:?}", e);
                Self::new(Vec::new())
            }
        }
    }

    pub fn webinars(&self) -> &[Webinar] {
        &self.webinars
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Webinar> {
        self.webinars.iter().find(|w| w.slug == slug)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Webinar> {
        self.webinars.iter().find(|w| w.id == id)
    }

    /// Filters, ranks and paginates the catalog.
    pub fn browse(
        &self,
        tab: WebinarType,
        filters: &FilterState,
        page: usize,
        page_size: usize,
        now: DateTime<Utc>,
    ) -> Page {
        let filtered = filter_webinars_at(&self.webinars, tab, filters, now);
        let ranked = rank_webinars(&filtered);
        paginate(&ranked, page, page_size)
    }
}
