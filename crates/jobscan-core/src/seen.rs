//! First-seen tracking for scan digests.
//!
//! Remembers which dedup keys have already been reported so a digest only
//! carries jobs that are new this cycle. Memory-resident by design — the
//! registry rebuilds itself after a restart (persistence is out of scope).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::models::JobRecord;

/// Thread-safe registry of already-reported jobs with age-based pruning.
#[derive(Clone)]
pub struct SeenJobs {
    first_seen: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    retention: Duration,
}

impl SeenJobs {
    /// Entries older than `retention_days` are pruned on each pass.
    pub fn new(retention_days: i64) -> Self {
        Self {
            first_seen: Arc::new(Mutex::new(HashMap::new())),
            retention: Duration::days(retention_days),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.first_seen.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned seen-jobs mutex");
            poisoned.into_inner()
        })
    }

    /// Drop already-seen records, mark the remainder as seen now.
    ///
    /// Prunes stale entries first, so a job that resurfaces after the
    /// retention window counts as new again.
    pub fn retain_new(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        let now = Utc::now();
        let cutoff = now - self.retention;
        let mut seen = self.lock();

        seen.retain(|_, first_seen| *first_seen >= cutoff);

        records
            .into_iter()
            .filter(|record| {
                let key = record.dedup_key();
                match seen.get(&key) {
                    Some(_) => false,
                    None => {
                        seen.insert(key, now);
                        true
                    }
                }
            })
            .collect()
    }

    /// Number of jobs currently remembered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for SeenJobs {
    /// 30-day retention.
    fn default() -> Self {
        Self::new(30)
    }
}
