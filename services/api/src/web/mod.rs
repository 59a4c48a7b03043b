pub mod debounce;
pub mod middleware;
pub mod personal;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the pieces the binary needs to assemble the server.
pub use middleware::require_visitor;
pub use state::AppState;
pub use ws_handler::ws_handler;

use axum::{
    http::{header::{ACCEPT, CONTENT_TYPE}, HeaderName, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: catalog routes, visitor routes,
/// the live browse socket and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(middleware::VISITOR_HEADER),
        ]);

    // Public routes (no visitor id required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/facets", get(rest::facets_handler))
        .route("/webinars/featured", get(rest::featured_handler))
        .route("/webinars/query", post(rest::query_webinars_handler))
        .route("/webinars/{slug}", get(rest::get_webinar_handler))
        .route(
            "/webinars/{slug}/recommendations",
            get(rest::recommendations_handler),
        )
        .route("/ws", get(ws_handler));

    // Visitor routes (state scoped to the x-visitor-id header)
    let visitor_routes = Router::new()
        .route("/bookmarks", get(personal::list_bookmarks_handler))
        .route(
            "/bookmarks/{id}/toggle",
            post(personal::toggle_bookmark_handler),
        )
        .route(
            "/webinars/{slug}/access",
            get(personal::access_status_handler).post(personal::grant_access_handler),
        )
        .route(
            "/webinars/{slug}/registrations",
            post(personal::register_handler),
        )
        .route_layer(axum_middleware::from_fn(require_visitor));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(visitor_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}
