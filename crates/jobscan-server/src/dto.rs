//! Request/response DTOs for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use jobscan_core::aggregator::ScanOutcome;
use jobscan_core::models::JobRecord;

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Search keywords, e.g. "rust developer".
    pub q: String,
    /// Target location; defaults to the configured country.
    pub location: Option<String>,
    /// Maximum number of results to return.
    pub limit: Option<usize>,
    /// Bypass the response cache and query providers again.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobDto {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    /// Which provider contributed this record.
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl From<JobRecord> for JobDto {
    fn from(record: JobRecord) -> Self {
        Self {
            title: record.title,
            company: record.company,
            location: record.location,
            url: record.url,
            source: record.source.to_string(),
            posted_at: record.posted_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub count: usize,
    /// True when the response was served from the cache.
    pub cache_hit: bool,
    /// True when every provider was attempted and none succeeded.
    pub exhausted: bool,
    pub jobs: Vec<JobDto>,
}

impl From<ScanOutcome> for SearchResponse {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            count: outcome.records.len(),
            cache_hit: outcome.cache_hit,
            exhausted: outcome.exhausted,
            jobs: outcome.records.into_iter().map(JobDto::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Overrides the configured scan keywords for this run.
    pub keywords: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDto {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
    /// Which filter keyword made this record eligible.
    pub why_matched: String,
}

impl From<(JobRecord, String)> for MatchDto {
    fn from((record, why_matched): (JobRecord, String)) -> Self {
        Self {
            title: record.title,
            company: record.company,
            location: record.location,
            url: record.url,
            source: record.source.to_string(),
            posted_at: record.posted_at,
            why_matched,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub run_id: Uuid,
    /// New eligible jobs found this run.
    pub count: usize,
    /// Everything the providers returned before filtering.
    pub total_scanned: usize,
    pub providers_failed: usize,
    pub matches: Vec<MatchDto>,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of providers the engine was built with.
    pub providers: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscan_core::models::ProviderId;
    use jobscan_core::testutil::make_job;

    #[test]
    fn test_job_dto_carries_source_name() {
        let dto = JobDto::from(make_job("Backend Developer", "Acme", ProviderId::Jooble));
        assert_eq!(dto.source, "jooble");
        assert_eq!(dto.title, "Backend Developer");
    }

    #[test]
    fn test_search_response_counts_records() {
        let outcome = ScanOutcome {
            records: vec![
                make_job("A", "Acme", ProviderId::JSearch),
                make_job("B", "Acme", ProviderId::JSearch),
            ],
            cache_hit: true,
            ..Default::default()
        };
        let response = SearchResponse::from(outcome);
        assert_eq!(response.count, 2);
        assert!(response.cache_hit);
        assert!(!response.exhausted);
    }

    #[test]
    fn test_match_dto_keeps_reason() {
        let pair = (
            make_job("Intern", "Acme", ProviderId::Adzuna),
            "matched 'intern'".to_string(),
        );
        let dto = MatchDto::from(pair);
        assert_eq!(dto.why_matched, "matched 'intern'");
    }
}
