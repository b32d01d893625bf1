pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod rate_limit;
pub mod seen;
pub mod testutil;
pub mod traits;

pub use aggregator::{Aggregator, ProviderFailure, ScanOutcome};
pub use cache::ResponseCache;
pub use config::{EngineConfig, RateLimitConfig};
pub use error::AppError;
pub use filter::EligibilityFilter;
pub use models::{JobRecord, ProviderId, SearchQuery, compute_hash};
pub use rate_limit::RateLimiter;
pub use seen::SeenJobs;
pub use traits::JobProvider;
