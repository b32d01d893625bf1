use std::future::Future;

use crate::error::AppError;
use crate::models::{JobRecord, ProviderId, SearchQuery};

/// One upstream job-search API.
///
/// Implementations are pure translators: build the provider's request shape
/// from the query, perform the call, normalize the raw response into
/// [`JobRecord`]s. They hold no cache or rate-limit state — that belongs to
/// the orchestrator — so they can be tested with a fake transport.
///
/// An `Ok(vec![])` means the provider genuinely matched nothing; failures
/// (network, timeout, non-2xx, malformed payload, auth) must surface as
/// errors, never as an empty list.
pub trait JobProvider: Send + Sync + Clone {
    fn id(&self) -> ProviderId;

    fn fetch(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<JobRecord>, AppError>> + Send;
}
