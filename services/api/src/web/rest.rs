//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the public catalog endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::personal::{
    self, AccessRequest, AccessResponse, BookmarkToggleResponse, RegistrationRequest,
    RegistrationResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, OpenApi, ToSchema};
use webinar_catalog_core::{
    domain::{Webinar, WebinarType},
    facets::{featured, Facets},
    filter::FilterState,
    pagination::DEFAULT_PAGE_SIZE,
    recommend::{recommend, DEFAULT_RECOMMENDATION_LIMIT},
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        facets_handler,
        featured_handler,
        query_webinars_handler,
        get_webinar_handler,
        recommendations_handler,
        personal::list_bookmarks_handler,
        personal::toggle_bookmark_handler,
        personal::access_status_handler,
        personal::grant_access_handler,
        personal::register_handler,
    ),
    components(
        schemas(
            HealthResponse,
            FacetsResponse,
            WebinarListResponse,
            WebinarDetailResponse,
            QueryRequest,
            PageResponse,
            BookmarkToggleResponse,
            AccessRequest,
            AccessResponse,
            RegistrationRequest,
            RegistrationResponse,
        )
    ),
    tags(
        (name = "Webinar Catalog API", description = "Browse, filter and personalize the webinar catalog.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    webinars: usize,
}

/// Distinct values for populating the filter controls.
#[derive(Serialize, ToSchema)]
pub struct FacetsResponse {
    topics: Vec<String>,
    authors: Vec<String>,
    integrations: Vec<String>,
    categories: Vec<String>,
    durations: Vec<&'static str>,
}

impl FacetsResponse {
    fn from_facets(facets: &Facets) -> Self {
        Self {
            topics: facets.topics.clone(),
            authors: facets.authors.clone(),
            integrations: facets.integrations.clone(),
            categories: facets.categories.clone(),
            durations: webinar_catalog_core::DurationBucket::ALL
                .iter()
                .map(|b| b.label())
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WebinarListResponse {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<Webinar>,
}

#[derive(Serialize, ToSchema)]
pub struct WebinarDetailResponse {
    #[schema(value_type = Object)]
    webinar: Webinar,
    popular: bool,
}

/// The tab, filters and page to browse.
#[derive(Deserialize, ToSchema)]
pub struct QueryRequest {
    /// `all` (default), `upcoming` or `past`.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "all")]
    tab: Option<WebinarType>,
    #[serde(default)]
    #[schema(value_type = Object)]
    filters: FilterState,
    /// 1-indexed page, default 1.
    #[serde(default)]
    page: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct PageResponse {
    #[schema(value_type = Vec<Object>)]
    items: Vec<Webinar>,
    page: usize,
    total_pages: usize,
    total_items: usize,
    active_filter_count: usize,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationParams {
    /// Maximum number of recommendations, default 3.
    limit: Option<usize>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check with the size of the loaded catalog.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        webinars: app_state.catalog.webinars().len(),
    })
}

/// Distinct topics, authors, integrations and categories across the catalog.
#[utoipa::path(
    get,
    path = "/facets",
    responses((status = 200, description = "Facet values", body = FacetsResponse))
)]
pub async fn facets_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(FacetsResponse::from_facets(app_state.catalog.facets()))
}

/// Featured webinars in catalog order, for the hero carousel.
#[utoipa::path(
    get,
    path = "/webinars/featured",
    responses((status = 200, description = "Featured webinars", body = WebinarListResponse))
)]
pub async fn featured_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(WebinarListResponse {
        items: featured(app_state.catalog.webinars()),
    })
}

/// Filter, rank and paginate the catalog.
#[utoipa::path(
    post,
    path = "/webinars/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "One page of ranked results", body = PageResponse),
        (status = 422, description = "Malformed query")
    )
)]
pub async fn query_webinars_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let tab = req.tab.unwrap_or(WebinarType::All);
    let page_number = req.page.unwrap_or(1);
    debug!(?tab, page = page_number, "Querying webinars");

    let page = app_state.catalog.browse(
        tab,
        &req.filters,
        page_number,
        DEFAULT_PAGE_SIZE,
        Utc::now(),
    );

    Json(PageResponse {
        items: page.items,
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
        active_filter_count: req.filters.active_filter_count(),
    })
}

/// A single webinar by slug.
#[utoipa::path(
    get,
    path = "/webinars/{slug}",
    params(("slug" = String, Path, description = "The webinar's slug.")),
    responses(
        (status = 200, description = "The webinar", body = WebinarDetailResponse),
        (status = 404, description = "No webinar with that slug")
    )
)]
pub async fn get_webinar_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let webinar = find_webinar(&app_state, &slug)?;
    Ok(Json(WebinarDetailResponse {
        popular: webinar.is_popular(),
        webinar: webinar.clone(),
    }))
}

/// "You might also like": webinars most similar to the given one.
#[utoipa::path(
    get,
    path = "/webinars/{slug}/recommendations",
    params(
        ("slug" = String, Path, description = "The focal webinar's slug."),
        RecommendationParams
    ),
    responses(
        (status = 200, description = "Recommended webinars, best first", body = WebinarListResponse),
        (status = 404, description = "No webinar with that slug")
    )
)]
pub async fn recommendations_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<RecommendationParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let focal = find_webinar(&app_state, &slug)?;
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    Ok(Json(WebinarListResponse {
        items: recommend(focal, app_state.catalog.webinars(), limit),
    }))
}

/// Looks up a webinar by slug, mapping a miss to 404.
pub(crate) fn find_webinar<'a>(
    app_state: &'a AppState,
    slug: &str,
) -> Result<&'a Webinar, (StatusCode, String)> {
    app_state.catalog.find_by_slug(slug).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("No webinar with slug '{}'", slug),
        )
    })
}
