use std::collections::HashMap;
use std::time::Duration;

use crate::error::AppError;
use crate::models::ProviderId;

/// Per-provider fixed-window rate budget.
///
/// A zero window or zero `max_calls` disables the provider entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct RateLimitConfig {
    #[serde(with = "secs")]
    pub window: Duration,
    pub max_calls: u32,
}

impl RateLimitConfig {
    pub fn new(window: Duration, max_calls: u32) -> Self {
        Self { window, max_calls }
    }

    pub fn disabled() -> Self {
        Self {
            window: Duration::ZERO,
            max_calls: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.window.is_zero() || self.max_calls == 0
    }
}

impl Default for RateLimitConfig {
    /// 60 calls per minute, mirroring the free-tier quota most providers give.
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_calls: 60,
        }
    }
}

// RATE_LIMITS_JSON carries plain integer seconds, e.g.
// {"jsearch": {"window": 60, "max_calls": 50}}.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(de)?))
    }
}

/// Static engine configuration, supplied once at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Location substituted into queries that carry none.
    pub default_country: String,
    /// Hard cap on the merged result list.
    pub max_results: usize,
    /// Below this many primary results, fallback providers are queried.
    pub min_results_primary: usize,
    /// How long a cached result set stays servable.
    pub cache_ttl: Duration,
    /// Provider priority: first entry is the primary, the rest are fallbacks.
    pub provider_order: Vec<ProviderId>,
    /// Overrides for the per-provider defaults.
    pub rate_limits: HashMap<ProviderId, RateLimitConfig>,
    /// Upper bound on any single upstream request.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_country: "Canada".to_string(),
            max_results: 100,
            min_results_primary: 40,
            cache_ttl: Duration::from_secs(3600),
            provider_order: vec![ProviderId::JSearch, ProviderId::Jooble, ProviderId::Adzuna],
            rate_limits: HashMap::new(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl EngineConfig {
    /// Read configuration from environment variables.
    ///
    /// - `DEFAULT_COUNTRY` (optional, defaults to "Canada")
    /// - `MAX_RESULTS` (optional, defaults to 100)
    /// - `MIN_RESULTS_PRIMARY` (optional, defaults to 40)
    /// - `CACHE_TTL_SECONDS` (optional, defaults to 3600)
    /// - `PROVIDER_ORDER` (optional, comma-separated, defaults to
    ///   "jsearch,jooble,adzuna")
    /// - `RATE_LIMITS_JSON` (optional, e.g.
    ///   `{"jsearch": {"window": 60, "max_calls": 50}}`)
    /// - `REQUEST_TIMEOUT_SECONDS` (optional, defaults to 20)
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let default_country =
            std::env::var("DEFAULT_COUNTRY").unwrap_or(defaults.default_country);
        let max_results = parse_env("MAX_RESULTS", defaults.max_results)?;
        let min_results_primary =
            parse_env("MIN_RESULTS_PRIMARY", defaults.min_results_primary)?;
        let cache_ttl = Duration::from_secs(parse_env(
            "CACHE_TTL_SECONDS",
            defaults.cache_ttl.as_secs(),
        )?);
        let request_timeout = Duration::from_secs(parse_env(
            "REQUEST_TIMEOUT_SECONDS",
            defaults.request_timeout.as_secs(),
        )?);

        let provider_order = match std::env::var("PROVIDER_ORDER") {
            Err(_) => defaults.provider_order,
            Ok(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()?,
        };

        let rate_limits = match std::env::var("RATE_LIMITS_JSON") {
            Err(_) => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::ConfigError(format!("invalid RATE_LIMITS_JSON: {e}"))
            })?,
        };

        let config = Self {
            default_country,
            max_results,
            min_results_primary,
            cache_ttl,
            provider_order,
            rate_limits,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot serve with.
    ///
    /// Runs at construction so a bad value fails startup instead of a scan.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_results == 0 {
            return Err(AppError::ConfigError("MAX_RESULTS must be at least 1".into()));
        }
        if self.cache_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "CACHE_TTL_SECONDS must be at least 1".into(),
            ));
        }
        if self.provider_order.is_empty() {
            return Err(AppError::ConfigError(
                "PROVIDER_ORDER must name at least one provider".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for provider in &self.provider_order {
            if !seen.insert(provider) {
                return Err(AppError::ConfigError(format!(
                    "PROVIDER_ORDER lists {provider} more than once"
                )));
            }
        }
        Ok(())
    }

    /// Effective rate budget for a provider: the override if present,
    /// the shared default otherwise.
    pub fn rate_limit(&self, provider: ProviderId) -> RateLimitConfig {
        self.rate_limits
            .get(&provider)
            .copied()
            .unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::ConfigError(format!(
                "invalid {name} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let config = EngineConfig {
            max_results: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            AppError::ConfigError(_)
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = EngineConfig {
            cache_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_provider_order_rejected() {
        let config = EngineConfig {
            provider_order: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let config = EngineConfig {
            provider_order: vec![ProviderId::Jooble, ProviderId::Jooble],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_override_wins() {
        let mut config = EngineConfig::default();
        config.rate_limits.insert(
            ProviderId::Adzuna,
            RateLimitConfig::new(Duration::from_secs(10), 3),
        );
        assert_eq!(config.rate_limit(ProviderId::Adzuna).max_calls, 3);
        assert_eq!(
            config.rate_limit(ProviderId::JSearch),
            RateLimitConfig::default()
        );
    }

    #[test]
    fn test_rate_limits_json_shape() {
        let raw = r#"{"jsearch": {"window": 60, "max_calls": 50}, "adzuna": {"window": 0, "max_calls": 0}}"#;
        let limits: HashMap<ProviderId, RateLimitConfig> = serde_json::from_str(raw).unwrap();
        assert_eq!(limits[&ProviderId::JSearch].max_calls, 50);
        assert!(limits[&ProviderId::Adzuna].is_disabled());
    }
}
