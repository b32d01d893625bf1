//! Keyword eligibility filtering over aggregated records.
//!
//! Applied by the scan route and the scheduler after aggregation; the
//! orchestrator itself returns everything the providers matched.

use crate::models::JobRecord;

/// Case-insensitive keyword filter over title + description.
///
/// Exclusion keywords are checked first and veto a record outright.
/// With a non-empty inclusion list, a record must contain at least one
/// inclusion keyword; an empty inclusion list accepts everything not
/// excluded.
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl EligibilityFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include: lowercase_all(include),
            exclude: lowercase_all(exclude),
        }
    }

    /// Read keyword lists from `FILTER_INCLUDE` / `FILTER_EXCLUDE`
    /// (comma-separated; unset means no filtering on that side).
    pub fn from_env() -> Self {
        Self::new(csv_env("FILTER_INCLUDE"), csv_env("FILTER_EXCLUDE"))
    }

    pub fn is_noop(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Returns the match reason when the record is eligible, `None` when
    /// it is filtered out.
    pub fn matches(&self, record: &JobRecord) -> Option<String> {
        let haystack = format!("{} {}", record.title, record.description).to_lowercase();

        if let Some(keyword) = self.exclude.iter().find(|k| haystack.contains(*k)) {
            tracing::debug!(title = %record.title, %keyword, "Record excluded");
            return None;
        }

        if self.include.is_empty() {
            return Some("no filter configured".to_string());
        }

        self.include
            .iter()
            .find(|k| haystack.contains(*k))
            .map(|keyword| format!("matched '{keyword}'"))
    }

    /// Keep eligible records, pairing each with its match reason.
    pub fn apply(&self, records: Vec<JobRecord>) -> Vec<(JobRecord, String)> {
        records
            .into_iter()
            .filter_map(|record| self.matches(&record).map(|reason| (record, reason)))
            .collect()
    }
}

fn lowercase_all(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn csv_env(name: &str) -> Vec<String> {
    match std::env::var(name) {
        Err(_) => vec![],
        Ok(raw) => raw.split(',').map(str::to_string).collect(),
    }
}
