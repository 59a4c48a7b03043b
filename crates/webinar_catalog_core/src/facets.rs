//! crates/webinar_catalog_core/src/facets.rs
//!
//! Derives the distinct values that populate the filter controls.

use crate::domain::Webinar;
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct facet values across a collection, each sorted and duplicate-free.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Facets {
    pub topics: Vec<String>,
    pub authors: Vec<String>,
    pub integrations: Vec<String>,
    pub categories: Vec<String>,
}

pub fn extract_facets(collection: &[Webinar]) -> Facets {
    Facets {
        topics: distinct(collection.iter().flat_map(|w| &w.topics)),
        authors: distinct(collection.iter().flat_map(|w| w.authors.iter().map(|a| &a.name))),
        integrations: distinct(collection.iter().flat_map(|w| &w.integration_tags)),
        categories: distinct(collection.iter().flat_map(|w| &w.what_brings_you_here)),
    }
}

/// Featured webinars in collection order, as shown in the hero carousel.
pub fn featured(collection: &[Webinar]) -> Vec<Webinar> {
    collection.iter().filter(|w| w.featured).cloned().collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .map(String::as_str)
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
