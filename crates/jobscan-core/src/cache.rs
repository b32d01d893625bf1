//! Time-bounded cache for provider result sets.
//!
//! Keyed by the query fingerprint. Entries expire by age comparison on
//! lookup (lazy eviction) — an expired entry is never served, it is removed
//! and reported as a miss. No background sweeper.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::JobRecord;

/// One cached result set with its creation time and lifetime.
#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<JobRecord>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// Thread-safe fingerprint → result-set cache.
///
/// One mutex around the whole map: reads and writes are short in-memory
/// operations, so per-fingerprint locking would buy nothing here.
#[derive(Clone, Debug, Default)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned cache mutex");
            poisoned.into_inner()
        })
    }

    /// Look up a fingerprint. Expired entries are evicted and reported
    /// as a miss; an empty cached list is a valid hit (a confirmed
    /// "no results" state).
    pub fn get(&self, fingerprint: &str) -> Option<Vec<JobRecord>> {
        let mut entries = self.lock_entries();
        match entries.get(fingerprint) {
            Some(entry) if entry.is_expired() => {
                entries.remove(fingerprint);
                tracing::debug!(%fingerprint, "Cache entry expired");
                None
            }
            Some(entry) => Some(entry.records.clone()),
            None => None,
        }
    }

    /// Store a result set, unconditionally replacing any existing entry
    /// for the fingerprint (last write wins).
    pub fn put(&self, fingerprint: &str, records: Vec<JobRecord>, ttl: Duration) {
        let mut entries = self.lock_entries();
        entries.insert(
            fingerprint.to_string(),
            CacheEntry {
                records,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}
