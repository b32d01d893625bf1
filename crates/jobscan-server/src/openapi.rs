use utoipa::OpenApi;

use crate::dto::{
    ErrorResponse, HealthResponse, JobDto, MatchDto, ScanRequest, ScanResponse, SearchResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobscan API",
        description = "Multi-provider job listing aggregation with caching, rate limiting, and provider fallback",
    ),
    paths(
        crate::routes::search,
        crate::routes::scan,
        crate::routes::health,
    ),
    components(schemas(
        SearchResponse,
        JobDto,
        ScanRequest,
        ScanResponse,
        MatchDto,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "search", description = "Ad-hoc aggregated search"),
        (name = "scan", description = "Filtered scan runs"),
        (name = "system", description = "Health and diagnostics"),
    )
)]
pub struct ApiDoc;
