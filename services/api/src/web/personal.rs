//! services/api/src/web/personal.rs
//!
//! Visitor-scoped endpoints: bookmarks, the email gate and registrations.
//! Every handler here sits behind `require_visitor`.

use crate::web::middleware::VisitorId;
use crate::web::rest::{find_webinar, WebinarListResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use webinar_catalog_core::{
    bookmarks::BookmarkSet,
    gate::{AccessGate, GateError, RegistrationLog},
    ports::ScopedStore,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BookmarkToggleResponse {
    pub webinar_id: String,
    pub bookmarked: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct AccessRequest {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct AccessResponse {
    pub slug: String,
    pub has_access: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RegistrationRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub webinar_title: String,
    pub full_name: String,
    pub email: String,
    pub timestamp: String,
}

fn gate_error(e: GateError) -> (StatusCode, String) {
    match e {
        GateError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        GateError::Port(e) => {
            error!("Failed to persist visitor state: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save your details".to_string(),
            )
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /bookmarks - The visitor's bookmarked webinars in catalog order
#[utoipa::path(
    get,
    path = "/bookmarks",
    params(("x-visitor-id" = uuid::Uuid, Header, description = "Anonymous visitor id.")),
    responses(
        (status = 200, description = "Bookmarked webinars", body = WebinarListResponse),
        (status = 400, description = "Missing or invalid visitor id")
    )
)]
pub async fn list_bookmarks_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(visitor): Extension<VisitorId>,
) -> impl IntoResponse {
    let store = ScopedStore::new(app_state.store.as_ref(), visitor);
    let bookmarks = BookmarkSet::load(&store).await;
    Json(WebinarListResponse {
        items: bookmarks.filter_bookmarked(app_state.catalog.webinars()),
    })
}

/// POST /bookmarks/{id}/toggle - Add or remove a bookmark
#[utoipa::path(
    post,
    path = "/bookmarks/{id}/toggle",
    params(
        ("id" = String, Path, description = "The webinar id."),
        ("x-visitor-id" = uuid::Uuid, Header, description = "Anonymous visitor id.")
    ),
    responses(
        (status = 200, description = "New bookmark membership", body = BookmarkToggleResponse),
        (status = 404, description = "No webinar with that id")
    )
)]
pub async fn toggle_bookmark_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(visitor): Extension<VisitorId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if app_state.catalog.find_by_id(&id).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("No webinar with id '{}'", id)));
    }

    let _guard = app_state.visitor_locks.lock(visitor).await;
    let store = ScopedStore::new(app_state.store.as_ref(), visitor);
    let mut bookmarks = BookmarkSet::load(&store).await;
    let bookmarked = bookmarks.toggle(&id).await;
    Ok(Json(BookmarkToggleResponse {
        webinar_id: id,
        bookmarked,
    }))
}

/// GET /webinars/{slug}/access - Whether the visitor passed the email gate
#[utoipa::path(
    get,
    path = "/webinars/{slug}/access",
    params(
        ("slug" = String, Path, description = "The webinar's slug."),
        ("x-visitor-id" = uuid::Uuid, Header, description = "Anonymous visitor id.")
    ),
    responses(
        (status = 200, description = "Access status", body = AccessResponse),
        (status = 404, description = "No webinar with that slug")
    )
)]
pub async fn access_status_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(visitor): Extension<VisitorId>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    find_webinar(&app_state, &slug)?;
    let store = ScopedStore::new(app_state.store.as_ref(), visitor);
    let has_access = AccessGate::new(&store).has_access(&slug).await;
    Ok(Json(AccessResponse { slug, has_access }))
}

/// POST /webinars/{slug}/access - Pass the email gate for a webinar
#[utoipa::path(
    post,
    path = "/webinars/{slug}/access",
    request_body = AccessRequest,
    params(
        ("slug" = String, Path, description = "The webinar's slug."),
        ("x-visitor-id" = uuid::Uuid, Header, description = "Anonymous visitor id.")
    ),
    responses(
        (status = 200, description = "Access granted", body = AccessResponse),
        (status = 404, description = "No webinar with that slug"),
        (status = 422, description = "Invalid email address")
    )
)]
pub async fn grant_access_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(visitor): Extension<VisitorId>,
    Path(slug): Path<String>,
    Json(req): Json<AccessRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    find_webinar(&app_state, &slug)?;
    let store = ScopedStore::new(app_state.store.as_ref(), visitor);
    AccessGate::new(&store)
        .grant(&slug, &req.email)
        .await
        .map_err(gate_error)?;
    Ok(Json(AccessResponse {
        slug,
        has_access: true,
    }))
}

/// POST /webinars/{slug}/registrations - Register for a webinar
#[utoipa::path(
    post,
    path = "/webinars/{slug}/registrations",
    request_body = RegistrationRequest,
    params(
        ("slug" = String, Path, description = "The webinar's slug."),
        ("x-visitor-id" = uuid::Uuid, Header, description = "Anonymous visitor id.")
    ),
    responses(
        (status = 201, description = "Registration recorded", body = RegistrationResponse),
        (status = 404, description = "No webinar with that slug"),
        (status = 422, description = "Missing name or invalid email")
    )
)]
pub async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(visitor): Extension<VisitorId>,
    Path(slug): Path<String>,
    Json(req): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let webinar = find_webinar(&app_state, &slug)?;
    let _guard = app_state.visitor_locks.lock(visitor).await;
    let store = ScopedStore::new(app_state.store.as_ref(), visitor);
    let registration = RegistrationLog::new(&store)
        .register(&webinar.title, &req.full_name, &req.email)
        .await
        .map_err(gate_error)?;
    info!("{} registered for '{}'", visitor, slug);

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            webinar_title: registration.webinar_title,
            full_name: registration.full_name,
            email: registration.email,
            timestamp: registration.timestamp,
        }),
    ))
}
