//! crates/webinar_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! Every field carries a serde default so that a record missing a field
//! still lands in the canonical shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Webinars with a popularity score above this are badged as popular.
pub const POPULAR_THRESHOLD: f64 = 80.0;

/// The content-type partition a webinar belongs to.
///
/// `All` is never assigned to real data; it is the wildcard tab value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebinarType {
    #[default]
    Past,
    Upcoming,
    All,
}

impl WebinarType {
    /// Parses a tab name, returning `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "past" => Some(Self::Past),
            "upcoming" => Some(Self::Upcoming),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A speaker or host of a webinar. The name is the identity used for matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A single webinar record in canonical shape.
///
/// Explicit `null`s read as the field's default, fractional durations are
/// rounded, and a stored `type` of `all` or an unknown value reads as `past`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Webinar {
    #[serde(deserialize_with = "lenient::or_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub slug: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub title: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub ai_summary: String,
    #[serde(deserialize_with = "lenient::minutes")]
    pub duration_minutes: u32,
    #[serde(deserialize_with = "lenient::or_default")]
    pub date_published: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub topics: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub thumbnail_url: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub video_url: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub authors: Vec<Author>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub featured: bool,
    #[serde(deserialize_with = "lenient::score")]
    pub popularity_score: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub is_new: bool,
    #[serde(rename = "type", deserialize_with = "lenient::webinar_type")]
    pub kind: WebinarType,
    #[serde(deserialize_with = "lenient::or_default")]
    pub integration_tags: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub what_brings_you_here: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_outcomes: Option<Vec<String>>,
}

impl Webinar {
    /// The publish instant, or `None` when `date_published` cannot be parsed.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.date_published)
    }

    pub fn is_popular(&self) -> bool {
        self.popularity_score > POPULAR_THRESHOLD
    }

    pub fn has_author(&self, name: &str) -> bool {
        self.authors.iter().any(|a| a.name == name)
    }
}

/// Parses the timestamp forms found in catalog data.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), and a bare
/// date (UTC midnight).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Field readers that substitute defaults instead of rejecting a record.
mod lenient {
    use super::WebinarType;
    use serde::{Deserialize, Deserializer};

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
        if !raw.is_finite() || raw <= 0.0 {
            return Ok(0);
        }
        Ok(raw.round().min(f64::from(u32::MAX)) as u32)
    }

    pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?
            .filter(|score| score.is_finite())
            .unwrap_or(0.0))
    }

    /// `all` is a tab wildcard, never a stored type.
    pub fn webinar_type<'de, D>(deserializer: D) -> Result<WebinarType, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .as_deref()
            .and_then(WebinarType::parse)
            .filter(|kind| *kind != WebinarType::All)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let webinar: Webinar = serde_json::from_str(r#"{"id": "w1", "title": "Intro"}"#).unwrap();
        assert_eq!(webinar.id, "w1");
        assert_eq!(webinar.kind, WebinarType::Past);
        assert!(webinar.topics.is_empty());
        assert!(webinar.what_brings_you_here.is_empty());
        assert_eq!(webinar.duration_minutes, 0);
        assert!(webinar.learning_outcomes.is_none());
    }

    #[test]
    fn type_field_uses_lowercase_names() {
        let webinar: Webinar = serde_json::from_str(r#"{"type": "upcoming"}"#).unwrap();
        assert_eq!(webinar.kind, WebinarType::Upcoming);
        let json = serde_json::to_value(&webinar).unwrap();
        assert_eq!(json["type"], "upcoming");
    }

    #[test]
    fn nulls_and_odd_values_read_as_defaults() {
        let webinar: Webinar = serde_json::from_str(
            r#"{
                "id": "w1",
                "title": null,
                "what_brings_you_here": null,
                "authors": [{"name": "Jane", "avatar_url": null}],
                "duration_minutes": 45.5,
                "popularity_score": null,
                "featured": null,
                "type": "all"
            }"#,
        )
        .unwrap();
        assert_eq!(webinar.title, "");
        assert!(webinar.what_brings_you_here.is_empty());
        assert_eq!(webinar.authors[0].avatar_url, "");
        assert_eq!(webinar.duration_minutes, 46);
        assert_eq!(webinar.popularity_score, 0.0);
        assert!(!webinar.featured);
        assert_eq!(webinar.kind, WebinarType::Past);

        let webinar: Webinar =
            serde_json::from_str(r#"{"duration_minutes": -5, "type": "Upcoming"}"#).unwrap();
        assert_eq!(webinar.duration_minutes, 0);
        assert_eq!(webinar.kind, WebinarType::Upcoming);
    }

    #[test]
    fn parses_supported_timestamp_forms() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-03-05"), Some(midnight));
        assert_eq!(parse_instant("2024-03-05T00:00:00Z"), Some(midnight));
        assert_eq!(parse_instant("2024-03-05T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_instant("2024-03-05T00:00:00.000"), Some(midnight));
        assert_eq!(parse_instant("next tuesday"), None);
        assert_eq!(parse_instant(""), None);
    }

    #[test]
    fn popularity_badge_is_strictly_above_threshold() {
        let mut webinar = Webinar { popularity_score: 80.0, ..Default::default() };
        assert!(!webinar.is_popular());
        webinar.popularity_score = 80.5;
        assert!(webinar.is_popular());
    }
}
