//! crates/webinar_catalog_core/src/filter.rs
//!
//! The filter pipeline: reduces a collection to the webinars matching the
//! active tab and every active facet constraint.
//!
//! Stages combine with AND; values selected within one stage combine with OR.
//! An empty selection never constrains.

use crate::domain::{Webinar, WebinarType};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel `date_range` value meaning "no recency constraint".
pub const ALL_TIME: &str = "all";

//=========================================================================================
// Duration Buckets
//=========================================================================================

/// A fixed duration range used for discretized filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationBucket {
    Under15,
    From15To30,
    From30To60,
    Over60,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 4] = [
        DurationBucket::Under15,
        DurationBucket::From15To30,
        DurationBucket::From30To60,
        DurationBucket::Over60,
    ];

    /// The bucket a duration falls into. Every duration has exactly one.
    pub fn for_minutes(minutes: u32) -> Self {
        match minutes {
            0..=14 => Self::Under15,
            15..=29 => Self::From15To30,
            30..=59 => Self::From30To60,
            _ => Self::Over60,
        }
    }

    pub fn contains(self, minutes: u32) -> bool {
        Self::for_minutes(minutes) == self
    }

    /// The label shown on filter controls, e.g. `"15-30 min"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Under15 => "<15 min",
            Self::From15To30 => "15-30 min",
            Self::From30To60 => "30-60 min",
            Self::Over60 => "60+ min",
        }
    }

    /// Parses a control label. The ` min` suffix is optional.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let key = label.strip_suffix("min").map(str::trim_end).unwrap_or(label);
        match key {
            "<15" => Some(Self::Under15),
            "15-30" => Some(Self::From15To30),
            "30-60" => Some(Self::From30To60),
            "60+" => Some(Self::Over60),
            _ => None,
        }
    }
}

//=========================================================================================
// Filter State
//=========================================================================================

/// A multi-select facet of `FilterState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Topic,
    Duration,
    Author,
    Integration,
    Category,
}

/// The visitor's current filter selections.
///
/// Defaults to "no constraint" everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub search: String,
    pub topics: Vec<String>,
    pub durations: Vec<String>,
    pub date_range: String,
    pub authors: Vec<String>,
    pub integrations: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterState {
    /// Adds `value` to the facet selection, or removes it if already selected.
    pub fn toggle(&mut self, facet: FacetKind, value: &str) {
        let selection = self.selection_mut(facet);
        if let Some(pos) = selection.iter().position(|v| v == value) {
            selection.remove(pos);
        } else {
            selection.push(value.to_string());
        }
    }

    /// Replaces the category selection with at most one category.
    pub fn select_category(&mut self, category: Option<&str>) {
        self.categories = category
            .filter(|c| !c.is_empty())
            .map(|c| vec![c.to_string()])
            .unwrap_or_default();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_date_range(&mut self, date_range: impl Into<String>) {
        self.date_range = date_range.into();
    }

    /// Resets every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of active selections, as shown on the filter badge.
    pub fn active_filter_count(&self) -> usize {
        self.topics.len()
            + self.durations.len()
            + self.authors.len()
            + self.integrations.len()
            + usize::from(!self.date_range.is_empty())
            + usize::from(!self.search.is_empty())
    }

    /// True when no stage of the pipeline would constrain.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.topics.is_empty()
            && self.durations.is_empty()
            && self.recency_days().is_none()
            && self.authors.is_empty()
            && self.integrations.is_empty()
            && self.categories.is_empty()
    }

    pub fn selection(&self, facet: FacetKind) -> &[String] {
        match facet {
            FacetKind::Topic => &self.topics,
            FacetKind::Duration => &self.durations,
            FacetKind::Author => &self.authors,
            FacetKind::Integration => &self.integrations,
            FacetKind::Category => &self.categories,
        }
    }

    fn selection_mut(&mut self, facet: FacetKind) -> &mut Vec<String> {
        match facet {
            FacetKind::Topic => &mut self.topics,
            FacetKind::Duration => &mut self.durations,
            FacetKind::Author => &mut self.authors,
            FacetKind::Integration => &mut self.integrations,
            FacetKind::Category => &mut self.categories,
        }
    }

    /// The recency window in days, if `date_range` sets one.
    fn recency_days(&self) -> Option<i64> {
        let raw = self.date_range.trim();
        if raw.is_empty() || raw == ALL_TIME {
            return None;
        }
        raw.parse::<i64>().ok()
    }
}

//=========================================================================================
// Pipeline
//=========================================================================================

/// Filters `collection` for `tab` and `filters`, evaluated against the current time.
pub fn filter_webinars(
    collection: &[Webinar],
    tab: WebinarType,
    filters: &FilterState,
) -> Vec<Webinar> {
    filter_webinars_at(collection, tab, filters, Utc::now())
}

/// Filters `collection` with the recency window anchored at `now`.
///
/// Pure: the input is never modified and the relative order of kept items is
/// preserved.
pub fn filter_webinars_at(
    collection: &[Webinar],
    tab: WebinarType,
    filters: &FilterState,
    now: DateTime<Utc>,
) -> Vec<Webinar> {
    let criteria = Criteria::new(tab, filters, now);
    collection
        .iter()
        .filter(|w| criteria.matches(w))
        .cloned()
        .collect()
}

/// The filter state compiled once per pipeline run.
struct Criteria<'a> {
    tab: WebinarType,
    needle: Option<String>,
    filters: &'a FilterState,
    buckets: Vec<Option<DurationBucket>>,
    cutoff: Option<DateTime<Utc>>,
}

impl<'a> Criteria<'a> {
    fn new(tab: WebinarType, filters: &'a FilterState, now: DateTime<Utc>) -> Self {
        // Whitespace-only input is ignored, otherwise the text is matched as typed.
        let needle =
            (!filters.search.trim().is_empty()).then(|| filters.search.to_lowercase());
        // An unknown label stays in the list as `None` so the stage still
        // constrains but never matches on it.
        let buckets = filters
            .durations
            .iter()
            .map(|label| DurationBucket::from_label(label))
            .collect();
        let cutoff = filters
            .recency_days()
            .and_then(Duration::try_days)
            .and_then(|window| now.checked_sub_signed(window))
            .or_else(|| filters.recency_days().map(|_| DateTime::<Utc>::MIN_UTC));

        Self { tab, needle, filters, buckets, cutoff }
    }

    fn matches(&self, w: &Webinar) -> bool {
        self.tab_matches(w)
            && self.search_matches(w)
            && any_selected(&self.filters.topics, &w.topics)
            && self.duration_matches(w)
            && self.recency_matches(w)
            && (self.filters.authors.is_empty()
                || w.authors.iter().any(|a| self.filters.authors.contains(&a.name)))
            && any_selected(&self.filters.integrations, &w.integration_tags)
            && any_selected(&self.filters.categories, &w.what_brings_you_here)
    }

    fn tab_matches(&self, w: &Webinar) -> bool {
        self.tab == WebinarType::All || w.kind == self.tab
    }

    fn search_matches(&self, w: &Webinar) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        let hit = |text: &str| text.to_lowercase().contains(needle.as_str());
        hit(&w.title)
            || hit(&w.description)
            || w.topics.iter().any(|t| hit(t))
            || w.authors.iter().any(|a| hit(&a.name))
    }

    fn duration_matches(&self, w: &Webinar) -> bool {
        self.buckets.is_empty()
            || self
                .buckets
                .iter()
                .flatten()
                .any(|bucket| bucket.contains(w.duration_minutes))
    }

    fn recency_matches(&self, w: &Webinar) -> bool {
        match self.cutoff {
            None => true,
            Some(cutoff) => w.published_at().is_some_and(|at| at >= cutoff),
        }
    }
}

fn any_selected(selected: &[String], values: &[String]) -> bool {
    selected.is_empty() || values.iter().any(|v| selected.contains(v))
}
