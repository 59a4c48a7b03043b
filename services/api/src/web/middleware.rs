//! services/api/src/web/middleware.rs
//!
//! Visitor identification for routes that read or write visitor state.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// The header carrying the anonymous visitor id generated by the browser.
pub const VISITOR_HEADER: &str = "x-visitor-id";

/// An anonymous browser identity that scopes persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitorId(pub Uuid);

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "visitor:{}", self.0)
    }
}

/// Middleware that reads the visitor id header.
///
/// If valid, inserts the `VisitorId` into request extensions for handlers to use.
/// If missing or malformed, returns 400 Bad Request.
pub async fn require_visitor(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let raw = req
        .headers()
        .get(VISITOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;

    let visitor = Uuid::parse_str(raw.trim()).map_err(|e| {
        debug!("Rejected visitor id '{}': {}", raw, e);
        StatusCode::BAD_REQUEST
    })?;

    req.extensions_mut().insert(VisitorId(visitor));
    Ok(next.run(req).await)
}
