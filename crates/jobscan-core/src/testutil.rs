//! Test utilities: mock provider and record builders.
//!
//! Handwritten mocks for dependency injection in unit tests, using
//! `Arc<Mutex<_>>` for interior mutability so assertions can inspect
//! recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{JobRecord, ProviderId};
use crate::traits::JobProvider;

/// Mock provider with a queue of canned responses and a call counter.
///
/// Each `fetch` pops the first queued response; when the queue is empty the
/// last configured default (empty list) is returned.
#[derive(Clone, Debug)]
pub struct MockProvider {
    id: ProviderId,
    responses: Arc<Mutex<Vec<Result<Vec<JobRecord>, AppError>>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockProvider {
    /// Provider that always returns the given records.
    pub fn returning(id: ProviderId, records: Vec<JobRecord>) -> Self {
        Self::with_responses(id, vec![Ok(records)])
    }

    /// Provider whose first fetch fails with the given error.
    pub fn failing(id: ProviderId, error: AppError) -> Self {
        Self::with_responses(id, vec![Err(error)])
    }

    pub fn with_responses(id: ProviderId, responses: Vec<Result<Vec<JobRecord>, AppError>>) -> Self {
        Self {
            id,
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// How many times `fetch` has been invoked.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl JobProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn fetch(
        &self,
        _query: &crate::models::SearchQuery,
    ) -> Result<Vec<JobRecord>, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(vec![])
        } else {
            responses.remove(0)
        }
    }
}

/// Build a record with a distinct identity per (title, company) pair.
pub fn make_job(title: &str, company: &str, source: ProviderId) -> JobRecord {
    JobRecord {
        title: title.to_string(),
        company: company.to_string(),
        location: "Toronto, CA".to_string(),
        description: format!("{title} at {company}"),
        url: format!(
            "https://jobs.example.com/{}/{}",
            company.to_lowercase().replace(' ', "-"),
            title.to_lowercase().replace(' ', "-")
        ),
        source,
        posted_at: None,
    }
}

/// Build `n` records attributed to `source`, each with a distinct dedup
/// key, disjoint from any other provider's batch.
pub fn make_jobs(n: usize, source: ProviderId) -> Vec<JobRecord> {
    (0..n)
        .map(|i| make_job(&format!("Developer {i}"), &format!("Acme {source}"), source))
        .collect()
}
