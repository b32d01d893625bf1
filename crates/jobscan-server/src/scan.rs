//! One full scan pass: aggregate, filter, drop already-seen jobs.
//!
//! Shared between the `/v1/scan` route and the scheduler so both report
//! the same thing.

use std::collections::HashMap;

use uuid::Uuid;

use jobscan_core::aggregator::Aggregator;
use jobscan_core::error::AppError;
use jobscan_core::filter::EligibilityFilter;
use jobscan_core::models::{JobRecord, SearchQuery};
use jobscan_core::seen::SeenJobs;
use jobscan_core::traits::JobProvider;

/// What one scan pass produced, new-this-run jobs only.
#[derive(Debug)]
pub struct ScanSummary {
    pub run_id: Uuid,
    pub matches: Vec<(JobRecord, String)>,
    pub total_scanned: usize,
    pub providers_failed: usize,
    pub cache_hit: bool,
}

pub async fn run_scan<P: JobProvider>(
    engine: &Aggregator<P>,
    filter: &EligibilityFilter,
    seen: &SeenJobs,
    keywords: &str,
    location: Option<&str>,
    force_refresh: bool,
) -> Result<ScanSummary, AppError> {
    let run_id = Uuid::new_v4();
    let config = engine.config();
    let location = location.unwrap_or(&config.default_country);
    let query = SearchQuery::new(keywords, location, config.max_results)?;

    let outcome = engine.scan(&query, force_refresh).await;
    let total_scanned = outcome.records.len();
    let providers_failed = outcome.failures.len();

    let eligible = filter.apply(outcome.records);

    // Seen-filtering works on records; carry the match reasons across by
    // dedup key.
    let mut reasons: HashMap<String, String> = eligible
        .iter()
        .map(|(record, reason)| (record.dedup_key(), reason.clone()))
        .collect();
    let fresh = seen.retain_new(eligible.into_iter().map(|(record, _)| record).collect());
    let matches: Vec<(JobRecord, String)> = fresh
        .into_iter()
        .filter_map(|record| {
            reasons
                .remove(&record.dedup_key())
                .map(|reason| (record, reason))
        })
        .collect();

    tracing::info!(
        %run_id,
        total_scanned,
        new_matches = matches.len(),
        providers_failed,
        cache_hit = outcome.cache_hit,
        "Scan completed"
    );

    Ok(ScanSummary {
        run_id,
        matches,
        total_scanned,
        providers_failed,
        cache_hit: outcome.cache_hit,
    })
}
