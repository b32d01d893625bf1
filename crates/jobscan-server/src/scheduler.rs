//! Periodic scan loop.
//!
//! Runs a scan every interval, optionally gated to certain local hours,
//! and delivers a digest when new eligible jobs were found. The loop
//! shuts down cooperatively through a cancellation token.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use tokio_util::sync::CancellationToken;

use jobscan_core::error::AppError;

use crate::digest::{Digest, DigestSink};
use crate::scan::run_scan;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Local hours (0-23) during which scans may run; `None` means always.
    pub allowed_hours: Option<HashSet<u32>>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            allowed_hours: None,
        }
    }
}

impl SchedulerConfig {
    /// Read `SCAN_INTERVAL_SECONDS` and `RUN_HOURS_LOCAL` (comma-separated
    /// hours, e.g. "8,12,18").
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SCAN_INTERVAL_SECONDS") {
            let secs: u64 = raw.parse().map_err(|_| {
                AppError::ConfigError(format!("invalid SCAN_INTERVAL_SECONDS: {raw}"))
            })?;
            if secs == 0 {
                return Err(AppError::ConfigError(
                    "SCAN_INTERVAL_SECONDS must be positive".into(),
                ));
            }
            config.interval = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("RUN_HOURS_LOCAL")
            && !raw.trim().is_empty()
        {
            config.allowed_hours = Some(parse_hours(&raw)?);
        }

        Ok(config)
    }
}

fn parse_hours(raw: &str) -> Result<HashSet<u32>, AppError> {
    let mut hours = HashSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let hour: u32 = part
            .parse()
            .map_err(|_| AppError::ConfigError(format!("invalid RUN_HOURS_LOCAL entry: {part}")))?;
        if hour > 23 {
            return Err(AppError::ConfigError(format!(
                "RUN_HOURS_LOCAL entries must be 0-23, got {hour}"
            )));
        }
        hours.insert(hour);
    }
    if hours.is_empty() {
        return Err(AppError::ConfigError(
            "RUN_HOURS_LOCAL must name at least one hour".into(),
        ));
    }
    Ok(hours)
}

/// True when a scan may run during the given local hour.
pub fn hour_allowed(allowed: &Option<HashSet<u32>>, hour: u32) -> bool {
    match allowed {
        None => true,
        Some(hours) => hours.contains(&hour),
    }
}

/// Run the scan loop until the token is cancelled.
pub async fn run<D: DigestSink>(
    state: Arc<AppState>,
    config: SchedulerConfig,
    sink: D,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.interval);
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        gated = config.allowed_hours.is_some(),
        "Scheduler started"
    );

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("Scheduler shutting down");
                return;
            }
            _ = interval.tick() => {
                let hour = chrono::Local::now().hour();
                if !hour_allowed(&config.allowed_hours, hour) {
                    tracing::debug!(hour, "Outside run hours; skipping cycle");
                    continue;
                }
                run_cycle(&state, &sink).await;
            }
        }
    }
}

async fn run_cycle<D: DigestSink>(state: &AppState, sink: &D) {
    let summary = match run_scan(
        &state.engine,
        &state.filter,
        &state.seen,
        &state.scan_keywords,
        None,
        false,
    )
    .await
    {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %e, "Scheduled scan failed");
            return;
        }
    };

    if summary.matches.is_empty() {
        tracing::debug!(run_id = %summary.run_id, "No new jobs this cycle");
        return;
    }

    let digest = Digest::new(summary.run_id, summary.matches);
    if let Err(e) = sink.deliver(&digest).await {
        tracing::error!(error = %e, run_id = %digest.run_id, "Digest delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_gate_always_allows() {
        assert!(hour_allowed(&None, 0));
        assert!(hour_allowed(&None, 23));
    }

    #[test]
    fn test_gate_allows_listed_hours_only() {
        let allowed = Some(HashSet::from([8, 12, 18]));
        assert!(hour_allowed(&allowed, 8));
        assert!(!hour_allowed(&allowed, 9));
    }

    #[test]
    fn test_parse_hours_accepts_csv_with_spaces() {
        let hours = parse_hours("8, 12 ,18").unwrap();
        assert_eq!(hours, HashSet::from([8, 12, 18]));
    }

    #[test]
    fn test_parse_hours_rejects_out_of_range() {
        assert!(matches!(
            parse_hours("8,24").unwrap_err(),
            AppError::ConfigError(_)
        ));
    }

    #[test]
    fn test_parse_hours_rejects_garbage() {
        assert!(parse_hours("eight").is_err());
        assert!(parse_hours(",,").is_err());
    }
}
