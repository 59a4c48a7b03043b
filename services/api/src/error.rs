//! services/api/src/error.rs
//!
//! Startup failures of the catalog service. Request-time errors are mapped to
//! status codes in the handlers and never reach this type.

use crate::config::ConfigError;
use webinar_catalog_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment could not be turned into a `Config`.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A catalog source or visitor store could not be set up.
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    /// Connecting to Postgres or running the migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_name_their_source() {
        let err: ApiError = ConfigError::MissingVar("CONTENTFUL_SPACE_ID".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing the environment variable CONTENTFUL_SPACE_ID"
        );

        let err: ApiError = PortError::NotFound("./data/webinars.json".to_string()).into();
        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));
    }
}
