use jobscan_core::aggregator::Aggregator;
use jobscan_core::filter::EligibilityFilter;
use jobscan_core::seen::SeenJobs;
use jobscan_providers::AnyProvider;

/// Shared application state, wrapped in an `Arc` by the router.
///
/// The engine, filter and seen-registry are all internally synchronized,
/// so handlers and the scheduler share one instance freely.
pub struct AppState {
    pub engine: Aggregator<AnyProvider>,
    pub filter: EligibilityFilter,
    pub seen: SeenJobs,
    /// Default keywords for scheduled scans and `/v1/scan` calls that
    /// don't supply their own.
    pub scan_keywords: String,
}

impl AppState {
    /// Keywords for scheduled scans come from `SCAN_KEYWORDS`.
    pub fn scan_keywords_from_env() -> String {
        std::env::var("SCAN_KEYWORDS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "software developer".to_string())
    }
}
