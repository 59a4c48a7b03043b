//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for the headless CMS delivery API.
#[derive(Clone, Debug)]
pub struct CmsConfig {
    pub base_url: String,
    pub space_id: String,
    pub delivery_token: String,
    pub environment: String,
    pub content_type: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Postgres URL for visitor state. Without one, state lives in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Static catalog used when no CMS is configured.
    pub webinars_path: PathBuf,
    pub cms: Option<CmsConfig>,
    /// Quiet period before a changed search is applied in a browse session.
    pub search_debounce: Duration,
    pub cors_origin: HeaderValue,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            webinars_path: PathBuf::from("./data/webinars.json"),
            cms: None,
            search_debounce: Duration::from_millis(300),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        // --- Server and Storage Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Catalog Source ---
        let webinars_path = std::env::var("WEBINARS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.webinars_path);

        let space_id = std::env::var("CONTENTFUL_SPACE_ID").ok().filter(|v| !v.is_empty());
        let delivery_token =
            std::env::var("CONTENTFUL_DELIVERY_TOKEN").ok().filter(|v| !v.is_empty());
        let cms = match (space_id, delivery_token) {
            (Some(space_id), Some(delivery_token)) => Some(CmsConfig {
                base_url: std::env::var("CONTENTFUL_BASE_URL")
                    .unwrap_or_else(|_| "https://cdn.contentful.com".to_string()),
                space_id,
                delivery_token,
                environment: std::env::var("CONTENTFUL_ENVIRONMENT")
                    .unwrap_or_else(|_| "master".to_string()),
                content_type: std::env::var("CONTENTFUL_CONTENT_TYPE")
                    .unwrap_or_else(|_| "webinar".to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingVar("CONTENTFUL_DELIVERY_TOKEN".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingVar("CONTENTFUL_SPACE_ID".to_string()))
            }
            (None, None) => None,
        };

        // --- Browse Session Settings ---
        let search_debounce = match std::env::var("SEARCH_DEBOUNCE_MS") {
            Ok(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|e| {
                ConfigError::InvalidValue("SEARCH_DEBOUNCE_MS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.search_debounce,
        };

        let cors_origin = match std::env::var("CORS_ORIGIN") {
            Ok(raw) => raw.parse::<HeaderValue>().map_err(|e| {
                ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
            })?,
            Err(_) => defaults.cors_origin,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            webinars_path,
            cms,
            search_debounce,
            cors_origin,
        })
    }
}
