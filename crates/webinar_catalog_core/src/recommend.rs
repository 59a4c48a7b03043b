//! crates/webinar_catalog_core/src/recommend.rs
//!
//! Content-similarity scoring for the "you might also like" list on a
//! webinar's detail view.

use crate::domain::Webinar;
use chrono::{DateTime, Duration, Utc};

/// Number of recommendations shown by default.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

const SHARED_TOPIC_WEIGHT: f64 = 10.0;
const SHARED_AUTHOR_BONUS: f64 = 5.0;
const SHARED_INTEGRATION_WEIGHT: f64 = 3.0;
const POPULARITY_DIVISOR: f64 = 10.0;
const FEATURED_BONUS: f64 = 2.0;
const RECENT_BONUS: f64 = 3.0;
const RECENT_WINDOW_DAYS: i64 = 30;

/// A candidate together with its affinity to the focal webinar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredWebinar<'a> {
    pub webinar: &'a Webinar,
    pub score: f64,
}

/// Returns up to `limit` webinars most similar to `focal`, scored at the current time.
pub fn recommend(focal: &Webinar, collection: &[Webinar], limit: usize) -> Vec<Webinar> {
    recommend_at(focal, collection, limit, Utc::now())
}

/// Like [`recommend`], with the recency bonus evaluated at `now`.
pub fn recommend_at(
    focal: &Webinar,
    collection: &[Webinar],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Webinar> {
    let mut scored = score_candidates(focal, collection, now);
    // Stable: equal scores keep collection order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
        .into_iter()
        .take(limit)
        .map(|s| s.webinar.clone())
        .collect()
}

/// Scores every webinar in `collection` except `focal`, in collection order.
pub fn score_candidates<'a>(
    focal: &Webinar,
    collection: &'a [Webinar],
    now: DateTime<Utc>,
) -> Vec<ScoredWebinar<'a>> {
    collection
        .iter()
        .filter(|candidate| candidate.id != focal.id)
        .map(|candidate| ScoredWebinar {
            webinar: candidate,
            score: affinity(focal, candidate, now),
        })
        .collect()
}

/// The additive affinity of `candidate` to `focal`.
pub fn affinity(focal: &Webinar, candidate: &Webinar, now: DateTime<Utc>) -> f64 {
    let shared_topics = candidate
        .topics
        .iter()
        .filter(|t| focal.topics.contains(t))
        .count();
    let shares_author = candidate
        .authors
        .iter()
        .any(|a| focal.has_author(&a.name));
    let shared_integrations = candidate
        .integration_tags
        .iter()
        .filter(|i| focal.integration_tags.contains(i))
        .count();

    let mut score = shared_topics as f64 * SHARED_TOPIC_WEIGHT
        + shared_integrations as f64 * SHARED_INTEGRATION_WEIGHT;
    if shares_author {
        score += SHARED_AUTHOR_BONUS;
    }
    if candidate.popularity_score.is_finite() {
        score += candidate.popularity_score / POPULARITY_DIVISOR;
    }
    if candidate.featured {
        score += FEATURED_BONUS;
    }
    if is_recent(candidate, now) {
        score += RECENT_BONUS;
    }
    score
}

fn is_recent(candidate: &Webinar, now: DateTime<Utc>) -> bool {
    candidate
        .published_at()
        .is_some_and(|at| now.signed_duration_since(at) < Duration::days(RECENT_WINDOW_DAYS))
}
