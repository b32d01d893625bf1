use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::AppError;

/// Identifier for an external job-search provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    JSearch,
    Jooble,
    Adzuna,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::JSearch, ProviderId::Jooble, ProviderId::Adzuna];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::JSearch => "jsearch",
            ProviderId::Jooble => "jooble",
            ProviderId::Adzuna => "adzuna",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsearch" => Ok(ProviderId::JSearch),
            "jooble" => Ok(ProviderId::Jooble),
            "adzuna" => Ok(ProviderId::Adzuna),
            other => Err(AppError::ConfigError(format!(
                "unknown provider '{other}' (expected one of: jsearch, jooble, adzuna)"
            ))),
        }
    }
}

/// Immutable search request handed to the engine.
///
/// The location defaults to the configured country when the caller supplies
/// none; that substitution happens at construction so the cache fingerprint
/// is stable regardless of how the query arrived.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    pub limit: usize,
    /// Provider-specific extras. BTreeMap keeps key order deterministic
    /// so the fingerprint is order-independent.
    pub filters: BTreeMap<String, String>,
}

impl SearchQuery {
    pub fn new(
        keywords: impl Into<String>,
        location: impl Into<String>,
        limit: usize,
    ) -> Result<Self, AppError> {
        let keywords = keywords.into();
        if keywords.trim().is_empty() {
            return Err(AppError::InvalidQuery("keywords must not be empty".into()));
        }
        if limit == 0 {
            return Err(AppError::InvalidQuery("limit must be positive".into()));
        }
        Ok(Self {
            keywords,
            location: location.into(),
            limit,
            filters: BTreeMap::new(),
        })
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Stable cache key for this query.
    ///
    /// Normalizes case and whitespace of the text fields so that trivially
    /// different spellings of the same search share one cache entry.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.keywords.trim().to_lowercase().as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.location.trim().to_lowercase().as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.limit.to_string().as_bytes());
        for (key, value) in &self.filters {
            hasher.update([0x1f]);
            hasher.update(key.as_bytes());
            hasher.update([0x1e]);
            hasher.update(value.trim().to_lowercase().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Canonical job record, normalized from any provider's response shape.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub source: ProviderId,
    /// Posting timestamp; not every provider reports one.
    pub posted_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Deterministic identity across providers.
    ///
    /// Two records with the same key are the same job no matter which
    /// provider returned them. Derived from the normalized title, company,
    /// and the posting URL with tracking parameters stripped.
    pub fn dedup_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize_field(&self.title).as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize_field(&self.company).as_bytes());
        hasher.update([0x1f]);
        hasher.update(canonical_url(&self.url).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn normalize_field(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Query parameter keys that identify the click, not the job.
const TRACKING_PARAMS: [&str; 6] = ["fbclid", "gclid", "msclkid", "ref", "source", "src"];

/// Strip tracking query parameters and the fragment from a posting URL.
///
/// Falls back to the lowercased raw string when the URL does not parse;
/// a malformed URL still yields a stable key.
fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.to_lowercase().as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.set_fragment(None);
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
