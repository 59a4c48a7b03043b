//! crates/webinar_catalog_core/src/ranking.rs
//!
//! The total order applied to a filtered collection: featured first, then
//! popularity descending, then most recently published.

use crate::domain::Webinar;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Returns the webinars in ranked order. The sort is stable.
pub fn rank_webinars(filtered: &[Webinar]) -> Vec<Webinar> {
    let mut keyed: Vec<(RankKey, &Webinar)> =
        filtered.iter().map(|w| (RankKey::of(w), w)).collect();
    keyed.sort_by(|(a, _), (b, _)| a.cmp_desc(b));
    keyed.into_iter().map(|(_, w)| w.clone()).collect()
}

/// Compares two webinars by rank; `Less` means `a` is shown first.
pub fn compare_rank(a: &Webinar, b: &Webinar) -> Ordering {
    RankKey::of(a).cmp_desc(&RankKey::of(b))
}

/// Pre-parsed ranking keys. Malformed values collapse to the lowest rank.
struct RankKey {
    featured: bool,
    score: f64,
    published: Option<DateTime<Utc>>,
}

impl RankKey {
    fn of(w: &Webinar) -> Self {
        let score = if w.popularity_score.is_finite() {
            w.popularity_score
        } else {
            f64::NEG_INFINITY
        };
        Self { featured: w.featured, score, published: w.published_at() }
    }

    fn cmp_desc(&self, other: &Self) -> Ordering {
        other
            .featured
            .cmp(&self.featured)
            .then_with(|| other.score.total_cmp(&self.score))
            // `None` orders below every `Some`.
            .then_with(|| other.published.cmp(&self.published))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webinar(id: &str, featured: bool, score: f64, date: &str) -> Webinar {
        Webinar {
            id: id.to_string(),
            featured,
            popularity_score: score,
            date_published: date.to_string(),
            ..Default::default()
        }
    }

    fn ids(items: &[Webinar]) -> Vec<&str> {
        items.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn featured_then_score_then_recency() {
        let input = vec![
            webinar("plain-high", false, 95.0, "2025-01-01"),
            webinar("featured-low", true, 10.0, "2024-01-01"),
            webinar("plain-mid-old", false, 50.0, "2023-01-01"),
            webinar("plain-mid-new", false, 50.0, "2025-02-01"),
            webinar("featured-high", true, 70.0, "2022-01-01"),
        ];
        let ranked = rank_webinars(&input);
        assert_eq!(
            ids(&ranked),
            ["featured-high", "featured-low", "plain-high", "plain-mid-new", "plain-mid-old"]
        );
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let input = vec![
            webinar("first", false, 40.0, "2025-01-01"),
            webinar("second", false, 40.0, "2025-01-01"),
            webinar("third", false, 40.0, "2025-01-01"),
        ];
        assert_eq!(ids(&rank_webinars(&input)), ["first", "second", "third"]);
    }

    #[test]
    fn malformed_values_rank_lowest_but_stay() {
        let input = vec![
            webinar("nan", false, f64::NAN, "2025-01-01"),
            webinar("undated", false, 40.0, "someday"),
            webinar("dated", false, 40.0, "2020-01-01"),
            webinar("low", false, 0.0, "2025-01-01"),
        ];
        let ranked = rank_webinars(&input);
        assert_eq!(ids(&ranked), ["dated", "undated", "low", "nan"]);
    }

    #[test]
    fn comparator_is_consistent_with_rank() {
        let a = webinar("a", true, 1.0, "2025-01-01");
        let b = webinar("b", false, 99.0, "2025-01-01");
        assert_eq!(compare_rank(&a, &b), Ordering::Less);
        assert_eq!(compare_rank(&b, &a), Ordering::Greater);
        assert_eq!(compare_rank(&a, &a), Ordering::Equal);
    }
}
