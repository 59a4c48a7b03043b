//! crates/webinar_catalog_core/src/pagination.rs

use crate::domain::Webinar;
use serde::Serialize;

/// Number of webinars shown per gallery page.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// One page of a ranked collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Webinar>,
    /// The 1-indexed page that was requested.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slices the 1-indexed `page` out of `ranked`.
///
/// Out-of-range pages (including page 0) come back empty rather than failing;
/// callers clamp. A zero page size yields no pages at all.
pub fn paginate(ranked: &[Webinar], page: usize, page_size: usize) -> Page {
    let total_items = ranked.len();
    if page_size == 0 {
        return Page { items: Vec::new(), page, total_pages: 0, total_items };
    }

    let total_pages = total_items.div_ceil(page_size);
    let items = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
        .and_then(|start| ranked.get(start..))
        .map(|rest| rest.iter().take(page_size).cloned().collect())
        .unwrap_or_default();

    Page { items, page, total_pages, total_items }
}
