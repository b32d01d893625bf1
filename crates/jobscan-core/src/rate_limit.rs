//! Per-provider request budgeting.
//!
//! Fixed-window counting: each provider gets an independent window length and
//! a maximum number of calls per window. The limiter never blocks or sleeps;
//! a rejected acquire means "this provider is unavailable for this attempt"
//! and backoff is the orchestrator's problem.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::RateLimitConfig;
use crate::models::ProviderId;

/// Counter state for one provider's current window.
#[derive(Debug)]
struct RateWindow {
    started_at: Instant,
    count: u32,
}

/// Thread-safe fixed-window rate limiter, one window per provider.
///
/// Windows are created lazily on the first acquire for a provider and live
/// for the rest of the process. The critical section covers only the counter
/// update, never any I/O.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limits: Arc<HashMap<ProviderId, RateLimitConfig>>,
    windows: Arc<Mutex<HashMap<ProviderId, RateWindow>>>,
}

impl RateLimiter {
    /// Build a limiter from per-provider overrides; providers absent from
    /// the map fall back to [`RateLimitConfig::default`].
    pub fn new(limits: HashMap<ProviderId, RateLimitConfig>) -> Self {
        Self {
            limits: Arc::new(limits),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn limit_for(&self, provider: ProviderId) -> RateLimitConfig {
        self.limits.get(&provider).copied().unwrap_or_default()
    }

    fn lock_windows(&self) -> std::sync::MutexGuard<'_, HashMap<ProviderId, RateWindow>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned rate limiter mutex");
            poisoned.into_inner()
        })
    }

    /// Try to consume one call from the provider's budget.
    ///
    /// Resets the window first when its length has elapsed, then admits the
    /// call if the post-reset count is below the maximum. Returns false
    /// without side effects otherwise. A disabled budget (zero window or
    /// zero max) always returns false.
    pub fn try_acquire(&self, provider: ProviderId) -> bool {
        let limit = self.limit_for(provider);
        if limit.is_disabled() {
            return false;
        }

        let mut windows = self.lock_windows();
        let window = windows.entry(provider).or_insert_with(|| RateWindow {
            started_at: Instant::now(),
            count: 0,
        });

        if window.started_at.elapsed() >= limit.window {
            window.started_at = Instant::now();
            window.count = 0;
        }

        if window.count < limit.max_calls {
            window.count += 1;
            true
        } else {
            tracing::debug!(provider = %provider, max_calls = limit.max_calls, "Rate budget exhausted");
            false
        }
    }

    /// Calls already admitted in the provider's current window.
    pub fn current_count(&self, provider: ProviderId) -> u32 {
        let limit = self.limit_for(provider);
        let windows = self.lock_windows();
        match windows.get(&provider) {
            Some(w) if w.started_at.elapsed() < limit.window => w.count,
            _ => 0,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
