//! The provider aggregation engine.
//!
//! One `scan` consults the cache, walks the providers in priority order
//! behind their rate budgets, merges and deduplicates whatever came back,
//! writes through to the cache, and returns the unified list. Provider
//! failures are recovered locally via fallback; callers never see them
//! as errors.

use std::collections::HashSet;

use crate::cache::ResponseCache;
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::models::{JobRecord, ProviderId, SearchQuery};
use crate::rate_limit::RateLimiter;
use crate::traits::JobProvider;

/// A provider that could not contribute to a scan, kept for observability.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub error: String,
}

/// Result of one `scan` invocation.
///
/// `records` is the whole contract towards callers; the rest exists for
/// logging and monitoring. An empty `records` is "no jobs found this
/// cycle", never a system error.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<JobRecord>,
    pub cache_hit: bool,
    pub failures: Vec<ProviderFailure>,
    /// True when at least one provider was attempted and none succeeded.
    pub exhausted: bool,
}

/// The aggregation engine: providers in priority order plus owned
/// rate-limiter and cache state.
///
/// Construct one instance at process start and hand it (cheaply cloned)
/// to every caller — route layer, scheduler, CLI. Safe under concurrent
/// `scan` calls; no lock is held across provider I/O.
#[derive(Clone, Debug)]
pub struct Aggregator<P: JobProvider> {
    providers: Vec<P>,
    limiter: RateLimiter,
    cache: ResponseCache,
    config: EngineConfig,
}

impl<P: JobProvider> Aggregator<P> {
    /// Build the engine. Fails fast on invalid configuration, an empty
    /// provider set, or a provider missing from the priority order.
    pub fn new(providers: Vec<P>, config: EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(AppError::ConfigError(
                "at least one provider must be configured".into(),
            ));
        }
        for provider in &providers {
            if !config.provider_order.contains(&provider.id()) {
                return Err(AppError::ConfigError(format!(
                    "provider {} is not listed in the priority order",
                    provider.id()
                )));
            }
        }
        let mut providers = providers;
        providers.sort_by_key(|p| {
            config
                .provider_order
                .iter()
                .position(|id| *id == p.id())
                .unwrap_or(usize::MAX)
        });

        let mut limits = config.rate_limits.clone();
        for provider in &config.provider_order {
            limits.entry(*provider).or_default();
        }

        Ok(Self {
            providers,
            limiter: RateLimiter::new(limits),
            cache: ResponseCache::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// How many providers the engine was built with.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Run one aggregation pass for the query.
    ///
    /// 1. On a cache hit (unless `force_refresh`) return immediately — no
    ///    network calls, no rate budget consumed.
    /// 2. Query the primary provider behind its rate check.
    /// 3. If the primary contributed fewer than `min_results_primary`
    ///    records (skips and errors count as zero), walk the fallbacks in
    ///    priority order, stopping once the cap is reached.
    /// 4. Merge in priority order, dedup first-wins, truncate to the cap.
    /// 5. Write through to the cache — an empty confirmed result included,
    ///    so a fruitless query does not hammer providers until its TTL ends.
    pub async fn scan(&self, query: &SearchQuery, force_refresh: bool) -> ScanOutcome {
        let fingerprint = query.fingerprint();

        if !force_refresh
            && let Some(records) = self.cache.get(&fingerprint)
        {
            tracing::debug!(
                fingerprint = %&fingerprint[..8],
                count = records.len(),
                "Cache hit"
            );
            return ScanOutcome {
                records,
                cache_hit: true,
                ..Default::default()
            };
        }

        let cap = self.config.max_results.min(query.limit);
        let mut collected: Vec<JobRecord> = Vec::new();
        let mut failures: Vec<ProviderFailure> = Vec::new();
        let mut any_success = false;

        let mut providers = self.providers.iter();

        // Primary.
        let mut primary_results = 0usize;
        if let Some(primary) = providers.next() {
            match self.call_provider(primary, query).await {
                Ok(records) => {
                    any_success = true;
                    primary_results = records.len();
                    tracing::info!(provider = %primary.id(), count = primary_results, "Primary provider responded");
                    collected.extend(records);
                }
                Err(e) => {
                    tracing::warn!(provider = %primary.id(), error = %e, "Primary provider unavailable, falling back");
                    failures.push(ProviderFailure {
                        provider: primary.id(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Fallbacks, only when the primary came up short.
        if primary_results < self.config.min_results_primary {
            for provider in providers {
                if collected.len() >= cap {
                    break;
                }
                match self.call_provider(provider, query).await {
                    Ok(records) => {
                        any_success = true;
                        tracing::info!(provider = %provider.id(), count = records.len(), "Fallback provider responded");
                        collected.extend(records);
                    }
                    Err(e) => {
                        tracing::warn!(provider = %provider.id(), error = %e, "Fallback provider unavailable");
                        failures.push(ProviderFailure {
                            provider: provider.id(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let records = dedupe_and_cap(collected, cap);
        let exhausted = !any_success && !failures.is_empty();
        if exhausted {
            tracing::warn!(
                fingerprint = %&fingerprint[..8],
                failures = failures.len(),
                "All providers exhausted; serving empty result"
            );
        }

        // Write-through, empty results included.
        self.cache
            .put(&fingerprint, records.clone(), self.config.cache_ttl);

        ScanOutcome {
            records,
            cache_hit: false,
            failures,
            exhausted,
        }
    }

    /// One provider call behind its rate-limit gate.
    async fn call_provider(
        &self,
        provider: &P,
        query: &SearchQuery,
    ) -> Result<Vec<JobRecord>, AppError> {
        let id = provider.id();
        if !self.limiter.try_acquire(id) {
            return Err(AppError::RateLimited(id));
        }
        provider.fetch(query).await
    }
}

/// Keep the first occurrence of each dedup key, then truncate.
///
/// Input arrives concatenated in provider-priority order, so "first wins"
/// means the primary provider's version survives ties.
fn dedupe_and_cap(records: Vec<JobRecord>, cap: usize) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len().min(cap));
    for record in records {
        if seen.insert(record.dedup_key()) {
            out.push(record);
            if out.len() >= cap {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::RateLimitConfig;
    use crate::testutil::{MockProvider, make_job, make_jobs};

    fn config(min_primary: usize, max_results: usize) -> EngineConfig {
        EngineConfig {
            min_results_primary: min_primary,
            max_results,
            cache_ttl: Duration::from_secs(60),
            ..Default::default()
        }
    }

    fn query() -> SearchQuery {
        SearchQuery::new("rust developer", "Canada", 100).unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let records = vec![
            make_job("Backend Developer", "Acme", ProviderId::JSearch),
            make_job("Backend Developer", "Acme", ProviderId::Jooble),
            make_job("Frontend Developer", "Acme", ProviderId::Jooble),
        ];
        let merged = dedupe_and_cap(records, 10);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, ProviderId::JSearch);
    }

    #[test]
    fn test_dedupe_caps_output() {
        let merged = dedupe_and_cap(make_jobs(20, ProviderId::JSearch), 5);
        assert_eq!(merged.len(), 5);
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_provider_calls() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(50, ProviderId::JSearch));
        let engine = Aggregator::new(vec![primary.clone()], config(40, 100)).unwrap();

        let first = engine.scan(&query(), false).await;
        let second = engine.scan(&query(), false).await;

        assert_eq!(primary.call_count(), 1);
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.records, second.records);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache_read() {
        let primary = MockProvider::with_responses(
            ProviderId::JSearch,
            vec![
                Ok(make_jobs(50, ProviderId::JSearch)),
                Ok(make_jobs(50, ProviderId::JSearch)),
            ],
        );
        let engine = Aggregator::new(vec![primary.clone()], config(40, 100)).unwrap();

        engine.scan(&query(), false).await;
        let refreshed = engine.scan(&query(), true).await;

        assert_eq!(primary.call_count(), 2);
        assert!(!refreshed.cache_hit);
    }

    #[tokio::test]
    async fn test_no_fallback_when_primary_meets_threshold() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(10, ProviderId::JSearch));
        let fallback = MockProvider::returning(ProviderId::Jooble, make_jobs(10, ProviderId::Jooble));
        let engine =
            Aggregator::new(vec![primary.clone(), fallback.clone()], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(outcome.records.len(), 10);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_when_primary_below_threshold() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(3, ProviderId::JSearch));
        let fallback = MockProvider::returning(ProviderId::Jooble, make_jobs(10, ProviderId::Jooble));
        let engine =
            Aggregator::new(vec![primary.clone(), fallback.clone()], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(fallback.call_count(), 1);
        assert_eq!(outcome.records.len(), 13);
    }

    #[tokio::test]
    async fn test_primary_error_triggers_fallback_without_failing_scan() {
        let primary = MockProvider::failing(
            ProviderId::JSearch,
            AppError::Timeout(20),
        );
        let fallback = MockProvider::returning(ProviderId::Jooble, make_jobs(4, ProviderId::Jooble));
        let engine =
            Aggregator::new(vec![primary, fallback.clone()], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].provider, ProviderId::JSearch);
        assert!(!outcome.exhausted);
    }

    #[tokio::test]
    async fn test_rate_limited_primary_is_skipped_not_fatal() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(10, ProviderId::JSearch));
        let fallback = MockProvider::returning(ProviderId::Jooble, make_jobs(6, ProviderId::Jooble));
        let mut cfg = config(5, 100);
        cfg.rate_limits
            .insert(ProviderId::JSearch, RateLimitConfig::disabled());
        let engine = Aggregator::new(vec![primary.clone(), fallback.clone()], cfg).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(primary.call_count(), 0);
        assert_eq!(fallback.call_count(), 1);
        assert_eq!(outcome.records.len(), 6);
    }

    #[tokio::test]
    async fn test_rate_limit_ceiling_across_scans() {
        let primary = MockProvider::with_responses(
            ProviderId::JSearch,
            (0..10).map(|_| Ok(make_jobs(50, ProviderId::JSearch))).collect(),
        );
        let mut cfg = config(40, 100);
        cfg.rate_limits.insert(
            ProviderId::JSearch,
            RateLimitConfig::new(Duration::from_secs(60), 2),
        );
        let engine = Aggregator::new(vec![primary.clone()], cfg).unwrap();

        // Force refresh so every scan goes upstream.
        for _ in 0..5 {
            engine.scan(&query(), true).await;
        }

        assert_eq!(primary.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dedup_across_providers_primary_wins() {
        let shared = make_job("Backend Developer", "Acme", ProviderId::JSearch);
        let mut duplicate = shared.clone();
        duplicate.source = ProviderId::Jooble;

        let primary = MockProvider::returning(ProviderId::JSearch, vec![shared]);
        let fallback = MockProvider::returning(
            ProviderId::Jooble,
            vec![duplicate, make_job("Frontend Developer", "Acme", ProviderId::Jooble)],
        );
        let engine = Aggregator::new(vec![primary, fallback], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(outcome.records.len(), 2);
        let keys: Vec<_> = outcome.records.iter().map(JobRecord::dedup_key).collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(outcome.records[0].source, ProviderId::JSearch);
    }

    #[tokio::test]
    async fn test_result_list_never_exceeds_cap() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(8, ProviderId::JSearch));
        let fallback = MockProvider::returning(
            ProviderId::Jooble,
            (0..8).map(|i| make_job(&format!("Role {i}"), "Globex", ProviderId::Jooble)).collect(),
        );
        let engine = Aggregator::new(vec![primary, fallback], config(20, 12)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(outcome.records.len(), 12);
    }

    #[tokio::test]
    async fn test_fallback_stops_early_once_cap_reached() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(2, ProviderId::JSearch));
        let second = MockProvider::returning(
            ProviderId::Jooble,
            (0..10).map(|i| make_job(&format!("Role {i}"), "Globex", ProviderId::Jooble)).collect(),
        );
        let third = MockProvider::returning(ProviderId::Adzuna, make_jobs(10, ProviderId::Adzuna));
        let engine = Aggregator::new(
            vec![primary, second, third.clone()],
            config(5, 10),
        )
        .unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert_eq!(third.call_count(), 0);
        assert_eq!(outcome.records.len(), 10);
    }

    #[tokio::test]
    async fn test_total_failure_returns_empty_and_caches_it() {
        let primary = MockProvider::failing(
            ProviderId::JSearch,
            AppError::NetworkError("connection refused".into()),
        );
        let fallback = MockProvider::failing(
            ProviderId::Jooble,
            AppError::ProviderStatus {
                provider: ProviderId::Jooble,
                status: 503,
            },
        );
        let engine =
            Aggregator::new(vec![primary.clone(), fallback.clone()], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert!(outcome.records.is_empty());
        assert!(outcome.exhausted);
        assert_eq!(outcome.failures.len(), 2);

        // The confirmed-empty state is cached: no further provider calls.
        let cached = engine.scan(&query(), false).await;
        assert!(cached.cache_hit);
        assert!(cached.records.is_empty());
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_matches_is_not_exhaustion() {
        let primary = MockProvider::returning(ProviderId::JSearch, vec![]);
        let fallback = MockProvider::returning(ProviderId::Jooble, vec![]);
        let engine = Aggregator::new(vec![primary, fallback], config(5, 100)).unwrap();

        let outcome = engine.scan(&query(), false).await;

        assert!(outcome.records.is_empty());
        assert!(!outcome.exhausted);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_query_limit_caps_below_config_max() {
        let primary = MockProvider::returning(ProviderId::JSearch, make_jobs(50, ProviderId::JSearch));
        let engine = Aggregator::new(vec![primary], config(5, 100)).unwrap();

        let small = SearchQuery::new("rust developer", "Canada", 7).unwrap();
        let outcome = engine.scan(&small, false).await;

        assert_eq!(outcome.records.len(), 7);
    }

    #[test]
    fn test_provider_not_in_priority_order_rejected() {
        let provider = MockProvider::returning(ProviderId::Adzuna, vec![]);
        let cfg = EngineConfig {
            provider_order: vec![ProviderId::JSearch, ProviderId::Jooble],
            ..Default::default()
        };
        assert!(matches!(
            Aggregator::new(vec![provider], cfg).unwrap_err(),
            AppError::ConfigError(_)
        ));
    }

    #[test]
    fn test_empty_provider_set_rejected() {
        let err =
            Aggregator::<MockProvider>::new(vec![], EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_providers_reordered_to_match_priority() {
        // Constructed out of order; the engine must treat jsearch as primary.
        let jooble = MockProvider::returning(ProviderId::Jooble, make_jobs(10, ProviderId::Jooble));
        let jsearch =
            MockProvider::returning(ProviderId::JSearch, make_jobs(50, ProviderId::JSearch));
        let engine =
            Aggregator::new(vec![jooble.clone(), jsearch.clone()], config(5, 100)).unwrap();

        engine.scan(&query(), false).await;

        assert_eq!(jsearch.call_count(), 1);
        assert_eq!(jooble.call_count(), 0);
    }
}
