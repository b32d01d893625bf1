use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobscan_core::models::SearchQuery;

use crate::dto::{
    HealthResponse, MatchDto, ScanRequest, ScanResponse, SearchParams, SearchResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::scan::run_scan;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/search", get(search))
        .route("/v1/scan", post(scan))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Aggregated job listings", body = SearchResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let config = state.engine.config();
    let location = params
        .location
        .unwrap_or_else(|| config.default_country.clone());
    let limit = params.limit.unwrap_or(config.max_results);

    let query = SearchQuery::new(&params.q, &location, limit)?;
    let outcome = state.engine.scan(&query, params.force).await;

    Ok(axum::Json(SearchResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan result with new eligible jobs", body = ScanResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
    ),
    tag = "scan"
)]
pub async fn scan(
    State(state): State<Arc<AppState>>,
    body: Option<axum::Json<ScanRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|axum::Json(r)| r).unwrap_or_default();
    let keywords = request
        .keywords
        .unwrap_or_else(|| state.scan_keywords.clone());

    let summary = run_scan(
        &state.engine,
        &state.filter,
        &state.seen,
        &keywords,
        request.location.as_deref(),
        request.force,
    )
    .await?;

    let response = ScanResponse {
        run_id: summary.run_id,
        count: summary.matches.len(),
        total_scanned: summary.total_scanned,
        providers_failed: summary.providers_failed,
        matches: summary.matches.into_iter().map(MatchDto::from).collect(),
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "healthy",
        providers: state.engine.provider_count(),
    })
}
