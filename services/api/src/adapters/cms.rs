//! services/api/src/adapters/cms.rs
//!
//! This module contains the adapter for the headless CMS (Contentful Delivery
//! API). It implements the `WebinarRepository` port from the `core` crate.
//!
//! CMS entries are loosely shaped: a field may be a link to another entry or
//! asset, a plain string, an inline object, or missing, and several source
//! field names may feed one canonical field. All of that is resolved here so
//! the engine only ever sees canonical `Webinar` records.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use webinar_catalog_core::{
    domain::{Author, Webinar, WebinarType},
    ports::{PortError, PortResult, WebinarRepository},
};

use crate::config::CmsConfig;

const INCLUDE_DEPTH: u8 = 2;
const PAGE_LIMIT: u32 = 1000;
const UNKNOWN_AUTHOR: &str = "Unknown";

//=========================================================================================
// Delivery API Payloads
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EntriesResponse {
    #[serde(default)]
    pub items: Vec<Entry>,
    #[serde(default)]
    pub includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
pub struct Includes {
    #[serde(default, rename = "Asset")]
    pub assets: Vec<Entry>,
    #[serde(default, rename = "Entry")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub sys: Sys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sys {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

//=========================================================================================
// Field Variants
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LinkKind {
    Asset,
    Entry,
}

/// The shapes a single CMS field value can take.
#[derive(Debug)]
enum FieldValue<'a> {
    /// A reference to an included entry or asset.
    Linked { id: &'a str, kind: LinkKind, inline: Option<&'a Map<String, Value>> },
    Text(&'a str),
    /// An object carrying its own `fields`, or a bare object.
    Inline(&'a Map<String, Value>),
    Missing,
}

impl<'a> FieldValue<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => FieldValue::Text(s),
            Value::Object(obj) => {
                let fields = obj.get("fields").and_then(Value::as_object);
                let sys = obj.get("sys").and_then(Value::as_object);
                match sys.and_then(|s| s.get("id")).and_then(Value::as_str) {
                    Some(id) => FieldValue::Linked { id, kind: link_kind(sys), inline: fields },
                    None => FieldValue::Inline(fields.unwrap_or(obj)),
                }
            }
            _ => FieldValue::Missing,
        }
    }
}

fn link_kind(sys: Option<&Map<String, Value>>) -> LinkKind {
    let named = |key: &str| sys.and_then(|s| s.get(key)).and_then(Value::as_str);
    match named("linkType").or_else(|| named("type")) {
        Some("Asset") => LinkKind::Asset,
        _ => LinkKind::Entry,
    }
}

/// JavaScript-style truthiness, which the CMS field fallbacks rely on.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The first truthy field among `keys`.
fn first<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| fields.get(*k)).find(|v| truthy(v))
}

fn first_str<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| truthy(v))
        .and_then(Value::as_str)
}

fn first_f64(fields: &Map<String, Value>, keys: &[&str]) -> f64 {
    first(fields, keys).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Lowercases and replaces each whitespace run with a dash.
fn slugify(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase()
}

//=========================================================================================
// Normalization
//=========================================================================================

/// Resolves entries of one delivery response into canonical webinars.
pub struct Normalizer<'a> {
    linked: HashMap<(LinkKind, &'a str), &'a Map<String, Value>>,
}

impl<'a> Normalizer<'a> {
    pub fn new(includes: &'a Includes) -> Self {
        let assets = includes.assets.iter().map(|e| (LinkKind::Asset, e));
        let entries = includes.entries.iter().map(|e| (LinkKind::Entry, e));
        let linked = assets
            .chain(entries)
            .filter_map(|(kind, e)| e.sys.id.as_deref().map(|id| ((kind, id), &e.fields)))
            .collect();
        Self { linked }
    }

    fn lookup(&self, kind: LinkKind, id: &str) -> Option<&'a Map<String, Value>> {
        self.linked.get(&(kind, id)).copied()
    }

    /// Reduces a list of linked entries, strings or objects to their labels.
    fn labels(&self, value: Option<&Value>) -> Vec<String> {
        let Some(Value::Array(items)) = value else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let fields = match FieldValue::classify(item) {
                    FieldValue::Text(s) => return Some(s.to_string()),
                    FieldValue::Linked { id, kind, inline } => {
                        self.lookup(kind, id).or(inline)?
                    }
                    FieldValue::Inline(fields) => fields,
                    FieldValue::Missing => return None,
                };
                first_str(fields, &["name", "title", "value"]).map(str::to_owned)
            })
            .collect()
    }

    /// The https URL of an asset given inline or by link.
    fn asset_url(&self, value: &Value) -> Option<String> {
        let fields = match FieldValue::classify(value) {
            FieldValue::Linked { id, inline, .. } => {
                inline.or_else(|| self.lookup(LinkKind::Asset, id))?
            }
            FieldValue::Inline(fields) => fields,
            FieldValue::Text(url) => return absolute_url(url),
            FieldValue::Missing => return None,
        };
        let url = fields.get("file")?.get("url")?.as_str()?;
        absolute_url(url)
    }

    fn authors(&self, value: Option<&Value>) -> Vec<Author> {
        let Some(Value::Array(items)) = value else {
            return Vec::new();
        };
        items.iter().map(|item| self.author(item)).collect()
    }

    fn author(&self, item: &Value) -> Author {
        let own = item.as_object();
        let own_str = |keys: &[&str]| own.and_then(|o| first_str(o, keys)).map(str::to_owned);

        if let FieldValue::Linked { id, .. } = FieldValue::classify(item) {
            let linked = self.lookup(LinkKind::Entry, id);
            let linked_str = |keys: &[&str]| linked.and_then(|f| first_str(f, keys));
            let avatar_url = linked
                .and_then(|f| first(f, &["avatar"]))
                .and_then(|avatar| self.asset_url(avatar))
                .or_else(|| linked_str(&["avatarUrl"]).map(str::to_owned))
                .unwrap_or_default();
            return Author {
                name: linked_str(&["name", "title"]).unwrap_or(UNKNOWN_AUTHOR).to_string(),
                avatar_url,
                role: linked_str(&["role", "position"])
                    .map(str::to_owned)
                    .or_else(|| own_str(&["role"])),
            };
        }

        let nested_name = own
            .and_then(|o| o.get("fields"))
            .and_then(Value::as_object)
            .and_then(|f| first_str(f, &["name"]))
            .map(str::to_owned);
        Author {
            name: own_str(&["name"])
                .or(nested_name)
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            avatar_url: own_str(&["avatarUrl"]).unwrap_or_default(),
            role: own_str(&["role"]),
        }
    }

    fn thumbnail(&self, f: &Map<String, Value>) -> String {
        let resolved = match first(f, &["thumbnail"]) {
            Some(thumb) => self.asset_url(thumb),
            None => first_str(f, &["thumbnail_url"]).map(str::to_owned),
        };
        resolved
            .or_else(|| first_str(f, &["thumbnailUrl"]).map(str::to_owned))
            .unwrap_or_default()
    }

    /// Maps one CMS entry to a canonical webinar. `now` stands in for a missing publish date.
    pub fn webinar(&self, entry: &Entry, now: DateTime<Utc>) -> Webinar {
        let f = &entry.fields;
        let sys_id = entry.sys.id.as_deref().filter(|id| !id.is_empty());

        let id = sys_id
            .or_else(|| first_str(f, &["id", "slug"]))
            .unwrap_or("unknown")
            .to_string();
        let nested_slug = f
            .get("fields")
            .and_then(Value::as_object)
            .and_then(|nested| first_str(nested, &["slug"]));
        let slug_source = first_str(f, &["slug"])
            .or(nested_slug)
            .or_else(|| first_str(f, &["title"]))
            .or(sys_id)
            .unwrap_or_default();

        let learning_outcomes = match first(f, &["learningOutcomes"]) {
            Some(list) => self.labels(Some(list)),
            None => first_str(f, &["learning_outcomes_raw"])
                .map(|raw| vec![raw.to_string()])
                .unwrap_or_default(),
        };

        Webinar {
            id,
            slug: slugify(slug_source),
            title: first_str(f, &["title", "name"]).unwrap_or("Untitled").to_string(),
            description: first_str(f, &["description", "summary", "ai_summary", "aiSummary"])
                .unwrap_or_default()
                .to_string(),
            ai_summary: first_str(f, &["aiSummary", "summary"]).unwrap_or_default().to_string(),
            duration_minutes: first_f64(f, &["durationMinutes", "duration"])
                .clamp(0.0, u32::MAX as f64) as u32,
            date_published: first_str(f, &["datePublished", "publishedAt", "date"])
                .map(str::to_owned)
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            topics: self.labels(first(f, &["topics", "topic"])),
            thumbnail_url: self.thumbnail(f),
            video_url: first_str(f, &["videoUrl", "video"]).unwrap_or_default().to_string(),
            authors: self.authors(f.get("authors")),
            featured: f.get("featured").is_some_and(truthy),
            popularity_score: first_f64(f, &["popularityScore"]),
            is_new: f.get("isNew").is_some_and(truthy),
            kind: first_str(f, &["type"])
                .and_then(WebinarType::parse)
                .filter(|kind| *kind != WebinarType::All)
                .unwrap_or_default(),
            integration_tags: self.labels(first(f, &["integrationTags", "integrations"])),
            what_brings_you_here: self
                .labels(first(f, &["whatBringsYouHere", "what_brings_you_here_raw"])),
            learning_outcomes: (!learning_outcomes.is_empty()).then_some(learning_outcomes),
        }
    }
}

fn absolute_url(url: &str) -> Option<String> {
    if url.is_empty() {
        None
    } else if url.starts_with("http") {
        Some(url.to_string())
    } else {
        Some(format!("https:{}", url))
    }
}

/// Normalizes every item of a delivery response.
pub fn normalize_entries(response: &EntriesResponse, now: DateTime<Utc>) -> Vec<Webinar> {
    let normalizer = Normalizer::new(&response.includes);
    response
        .items
        .iter()
        .map(|entry| normalizer.webinar(entry, now))
        .collect()
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `WebinarRepository` against the CMS delivery API.
#[derive(Clone)]
pub struct CmsRepository {
    http_client: reqwest::Client,
    config: CmsConfig,
}

impl CmsRepository {
    /// Creates a new `CmsRepository`.
    pub fn new(config: CmsConfig) -> PortResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self { http_client, config })
    }

    fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.config.base_url.trim_end_matches('/'),
            self.config.space_id,
            self.config.environment
        )
    }
}

//=========================================================================================
// `WebinarRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl WebinarRepository for CmsRepository {
    async fn fetch_webinars(&self) -> PortResult<Vec<Webinar>> {
        let url = self.entries_url();
        debug!(url = %url, content_type = %self.config.content_type, "Querying CMS entries");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.delivery_token)
            .query(&[
                ("content_type", self.config.content_type.clone()),
                ("include", INCLUDE_DEPTH.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!(
                "CMS space {} / environment {}",
                self.config.space_id, self.config.environment
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "CMS returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let payload: EntriesResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let webinars = normalize_entries(&payload, Utc::now());
        info!("Loaded {} webinars from the CMS", webinars.len());
        Ok(webinars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn normalize(payload: Value) -> Vec<Webinar> {
        let response: EntriesResponse = serde_json::from_value(payload).unwrap();
        normalize_entries(&response, now())
    }

    #[test]
    fn resolves_linked_entries_and_assets() {
        let webinars = normalize(json!({
            "items": [{
                "sys": {"id": "entry-1", "type": "Entry"},
                "fields": {
                    "title": "Data Governance 101",
                    "slug": "Data Governance 101",
                    "durationMinutes": 45,
                    "datePublished": "2025-05-01T10:00:00Z",
                    "featured": true,
                    "popularityScore": 88,
                    "type": "upcoming",
                    "thumbnail": {"sys": {"type": "Link", "linkType": "Asset", "id": "thumb"}},
                    "topics": [
                        {"sys": {"type": "Link", "linkType": "Entry", "id": "topic-gov"}},
                        "Catalog",
                        {"fields": {"title": "Lineage"}},
                        {"name": "AI"},
                        42
                    ],
                    "authors": [
                        {"sys": {"type": "Link", "linkType": "Entry", "id": "author-jane"}},
                        {"name": "Sam Roe", "avatarUrl": "https://img/sam.png", "role": "PM"}
                    ],
                    "integrations": ["Snowflake"],
                    "whatBringsYouHere": ["Explore"],
                    "learningOutcomes": ["Ship a catalog"]
                }
            }],
            "includes": {
                "Asset": [
                    {"sys": {"id": "thumb"}, "fields": {"file": {"url": "//images.cms/thumb.png"}}},
                    {"sys": {"id": "avatar-jane"}, "fields": {"file": {"url": "https://images.cms/jane.png"}}}
                ],
                "Entry": [
                    {"sys": {"id": "topic-gov"}, "fields": {"name": "Governance"}},
                    {"sys": {"id": "author-jane"}, "fields": {
                        "name": "Jane Doe",
                        "position": "Head of Data",
                        "avatar": {"sys": {"type": "Link", "linkType": "Asset", "id": "avatar-jane"}}
                    }}
                ]
            }
        }));

        let w = &webinars[0];
        assert_eq!(w.id, "entry-1");
        assert_eq!(w.slug, "data-governance-101");
        assert_eq!(w.duration_minutes, 45);
        assert_eq!(w.kind, WebinarType::Upcoming);
        assert!(w.featured);
        assert_eq!(w.popularity_score, 88.0);
        assert_eq!(w.thumbnail_url, "https://images.cms/thumb.png");
        assert_eq!(w.topics, ["Governance", "Catalog", "Lineage", "AI"]);
        assert_eq!(w.integration_tags, ["Snowflake"]);
        assert_eq!(w.what_brings_you_here, ["Explore"]);
        assert_eq!(w.learning_outcomes.as_deref(), Some(&["Ship a catalog".to_string()][..]));

        assert_eq!(w.authors[0].name, "Jane Doe");
        assert_eq!(w.authors[0].role.as_deref(), Some("Head of Data"));
        assert_eq!(w.authors[0].avatar_url, "https://images.cms/jane.png");
        assert_eq!(w.authors[1].name, "Sam Roe");
        assert_eq!(w.authors[1].avatar_url, "https://img/sam.png");
    }

    #[test]
    fn missing_fields_get_safe_defaults() {
        let webinars = normalize(json!({
            "items": [{"sys": {"id": "bare"}, "fields": {}}]
        }));
        let w = &webinars[0];
        assert_eq!(w.id, "bare");
        assert_eq!(w.slug, "bare");
        assert_eq!(w.title, "Untitled");
        assert_eq!(w.duration_minutes, 0);
        assert_eq!(w.kind, WebinarType::Past);
        assert_eq!(w.date_published, "2025-06-01T00:00:00.000Z");
        assert!(w.topics.is_empty());
        assert!(w.authors.is_empty());
        assert!(w.learning_outcomes.is_none());
        assert_eq!(w.thumbnail_url, "");
    }

    #[test]
    fn falls_back_across_source_field_names() {
        let webinars = normalize(json!({
            "items": [{
                "fields": {
                    "name": "Lineage Deep Dive",
                    "slug": "",
                    "summary": "All about lineage",
                    "duration": 20,
                    "publishedAt": "2024-12-01",
                    "topic": ["Lineage"],
                    "integrationTags": ["dbt"],
                    "thumbnail_url": "https://img/lineage.png",
                    "authors": [{"fields": {"name": "Nested Name"}}, {}],
                    "learning_outcomes_raw": "Trace a column",
                    "type": "something-else"
                }
            }]
        }));
        let w = &webinars[0];
        assert_eq!(w.id, "unknown");
        assert_eq!(w.title, "Lineage Deep Dive");
        assert_eq!(w.slug, "");
        assert_eq!(w.description, "All about lineage");
        assert_eq!(w.ai_summary, "All about lineage");
        assert_eq!(w.duration_minutes, 20);
        assert_eq!(w.date_published, "2024-12-01");
        assert_eq!(w.topics, ["Lineage"]);
        assert_eq!(w.integration_tags, ["dbt"]);
        assert_eq!(w.thumbnail_url, "https://img/lineage.png");
        assert_eq!(w.authors[0].name, "Nested Name");
        assert_eq!(w.authors[1].name, "Unknown");
        assert_eq!(w.learning_outcomes.as_deref(), Some(&["Trace a column".to_string()][..]));
        assert_eq!(w.kind, WebinarType::Past);
    }

    #[test]
    fn unresolvable_links_are_dropped() {
        let webinars = normalize(json!({
            "items": [{
                "sys": {"id": "x"},
                "fields": {
                    "topics": [{"sys": {"type": "Link", "linkType": "Entry", "id": "gone"}}],
                    "authors": [{"sys": {"type": "Link", "linkType": "Entry", "id": "gone"}}]
                }
            }]
        }));
        assert!(webinars[0].topics.is_empty());
        assert_eq!(webinars[0].authors[0].name, "Unknown");
    }

    #[test]
    fn slugify_collapses_whitespace() {
        assert_eq!(slugify("  Hello   Big World "), "hello-big-world");
    }
}
