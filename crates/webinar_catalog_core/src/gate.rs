//! crates/webinar_catalog_core/src/gate.rs
//!
//! The email gate in front of webinar recordings and the local registration
//! log for upcoming webinars.

use crate::ports::{KeyValueStore, PortError, PortResult};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Storage key holding the JSON array of registrations.
pub const REGISTRATIONS_KEY: &str = "webinar_registrations";

const ACCESS_KEY_PREFIX: &str = "webinar_access_";
const GRANTED: &str = "true";

//=========================================================================================
// Validation
//=========================================================================================

/// Rejected visitor input.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors from gate and registration writes.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Port(#[from] PortError),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email_pattern().is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

//=========================================================================================
// Access Gate
//=========================================================================================

/// Per-webinar access flags, keyed by slug.
pub struct AccessGate<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> AccessGate<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn access_key(slug: &str) -> String {
        format!("{ACCESS_KEY_PREFIX}{slug}")
    }

    /// Whether the gate for `slug` has been passed. Storage errors read as "no access".
    pub async fn has_access(&self, slug: &str) -> bool {
        match self.store.get(&Self::access_key(slug)).await {
            Ok(value) => value.as_deref() == Some(GRANTED),
            Err(e) => {
                warn!("Failed to read access flag for {}: {:?}", slug, e);
                false
            }
        }
    }

    /// Validates `email` and records that the gate for `slug` was passed.
    pub async fn grant(&self, slug: &str, email: &str) -> Result<(), GateError> {
        validate_email(email.trim())?;
        self.store.set(&Self::access_key(slug), GRANTED).await?;
        info!("Access granted for webinar '{}'", slug);
        Ok(())
    }

    /// Slugs of every webinar unlocked so far.
    pub async fn unlocked(&self) -> PortResult<Vec<String>> {
        let entries = self.store.list(ACCESS_KEY_PREFIX).await?;
        Ok(entries
            .into_iter()
            .filter(|(_, value)| value == GRANTED)
            .filter_map(|(key, _)| key.strip_prefix(ACCESS_KEY_PREFIX).map(str::to_owned))
            .collect())
    }
}

//=========================================================================================
// Registration Log
//=========================================================================================

/// One captured registration. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub webinar_title: String,
    pub full_name: String,
    pub email: String,
    pub timestamp: String,
}

/// Append-only log of registrations, stored as one JSON array.
pub struct RegistrationLog<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> RegistrationLog<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// All registrations so far. Corrupt state reads as an empty log.
    pub async fn list(&self) -> PortResult<Vec<Registration>> {
        let Some(raw) = self.store.get(REGISTRATIONS_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt registration log: {}", e);
            Vec::new()
        }))
    }

    /// Validates and appends a registration, returning the stored record.
    pub async fn register(
        &self,
        webinar_title: &str,
        full_name: &str,
        email: &str,
    ) -> Result<Registration, GateError> {
        let full_name = full_name.trim();
        let email = email.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingField("fullName").into());
        }
        if email.is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        validate_email(email)?;

        let registration = Registration {
            webinar_title: webinar_title.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut log = self.list().await?;
        log.push(registration.clone());
        let encoded =
            serde_json::to_string(&log).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(REGISTRATIONS_KEY, &encoded).await?;
        info!("Registered '{}' for '{}'", registration.email, webinar_title);
        Ok(registration)
    }
}
