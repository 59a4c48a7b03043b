//! services/api/src/adapters/static_json.rs
//!
//! The fallback catalog source: a local JSON array of webinars in canonical
//! shape. Bad values fall back to defaults and unreadable records are skipped.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};
use webinar_catalog_core::{
    domain::Webinar,
    ports::{PortError, PortResult, WebinarRepository},
};

/// An adapter that implements `WebinarRepository` by reading a JSON file.
#[derive(Clone, Debug)]
pub struct StaticJsonRepository {
    path: PathBuf,
}

impl StaticJsonRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WebinarRepository for StaticJsonRepository {
    async fn fetch_webinars(&self) -> PortResult<Vec<Webinar>> {
        info!("Loading webinars from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PortError::NotFound(self.path.display().to_string()),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| {
            PortError::Unexpected(format!("{} is not a webinar list: {}", self.path.display(), e))
        })?;

        // A record that still does not fit is dropped on its own.
        let total = records.len();
        let webinars: Vec<Webinar> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(webinar) => Some(webinar),
                Err(e) => {
                    warn!("Skipping webinar record {} in {}: {}", index, self.path.display(), e);
                    None
                }
            })
            .collect();
        if webinars.len() < total {
            warn!("Skipped {} of {} webinar records", total - webinars.len(), total);
        }
        Ok(webinars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webinar_catalog_core::domain::WebinarType;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_canonical_records_with_defaults() {
        let path = temp_file(
            "webinars.json",
            r#"[{"id": "1", "slug": "intro", "title": "Intro", "type": "upcoming"}, {"id": "2"}]"#,
        );
        let webinars = StaticJsonRepository::new(&path).fetch_webinars().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(webinars.len(), 2);
        assert_eq!(webinars[0].slug, "intro");
        assert!(webinars[1].authors.is_empty());
    }

    #[tokio::test]
    async fn odd_records_fall_back_instead_of_failing_the_file() {
        let path = temp_file(
            "webinars.json",
            r#"[
                {"id": "a", "what_brings_you_here": null, "duration_minutes": 45.5},
                {"id": "b", "type": "all", "topics": ["x"]},
                {"id": "c", "topics": "not a list"},
                {"id": "d", "type": "upcoming"}
            ]"#,
        );
        let webinars = StaticJsonRepository::new(&path).fetch_webinars().await.unwrap();
        std::fs::remove_file(&path).ok();

        let ids: Vec<&str> = webinars.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "d"]);
        assert!(webinars[0].what_brings_you_here.is_empty());
        assert_eq!(webinars[0].duration_minutes, 46);
        assert_eq!(webinars[1].kind, WebinarType::Past);
        assert_eq!(webinars[2].kind, WebinarType::Upcoming);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let repo = StaticJsonRepository::new("/definitely/not/here.json");
        assert!(matches!(repo.fetch_webinars().await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let path = temp_file("broken.json", "{\"not\": \"a list\"}");
        let result = StaticJsonRepository::new(&path).fetch_webinars().await;
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }
}
