pub mod adzuna;
pub mod credentials;
pub mod http;
pub mod jooble;
pub mod jsearch;

pub use adzuna::AdzunaProvider;
pub use credentials::ProviderCredentials;
pub use http::ProviderHttpClient;
pub use jooble::JoobleProvider;
pub use jsearch::JSearchProvider;

use jobscan_core::config::EngineConfig;
use jobscan_core::error::AppError;
use jobscan_core::models::{JobRecord, ProviderId, SearchQuery};
use jobscan_core::traits::JobProvider;

/// The closed set of real providers behind one [`JobProvider`] surface.
///
/// Adding a provider means adding a variant here and an adapter module;
/// the orchestrator stays untouched.
#[derive(Clone, Debug)]
pub enum AnyProvider {
    JSearch(JSearchProvider),
    Jooble(JoobleProvider),
    Adzuna(AdzunaProvider),
}

impl JobProvider for AnyProvider {
    fn id(&self) -> ProviderId {
        match self {
            AnyProvider::JSearch(p) => p.id(),
            AnyProvider::Jooble(p) => p.id(),
            AnyProvider::Adzuna(p) => p.id(),
        }
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<JobRecord>, AppError> {
        match self {
            AnyProvider::JSearch(p) => p.fetch(query).await,
            AnyProvider::Jooble(p) => p.fetch(query).await,
            AnyProvider::Adzuna(p) => p.fetch(query).await,
        }
    }
}

/// Instantiate every provider from the priority order that has credentials.
///
/// Providers without credentials are skipped with a warning — they simply
/// don't serve. No usable provider at all is a configuration error: the
/// aggregator refuses to start rather than failing silently mid-scan.
pub fn build_providers(
    credentials: &ProviderCredentials,
    config: &EngineConfig,
) -> Result<Vec<AnyProvider>, AppError> {
    let http = ProviderHttpClient::new(config.request_timeout)?;
    let mut providers = Vec::new();

    for id in &config.provider_order {
        match id {
            ProviderId::JSearch => match &credentials.jsearch_api_key {
                Some(key) => providers.push(AnyProvider::JSearch(JSearchProvider::new(
                    http.clone(),
                    key,
                    &credentials.country_code,
                )?)),
                None => tracing::warn!(provider = %id, "No API key configured; provider disabled"),
            },
            ProviderId::Jooble => match &credentials.jooble_api_key {
                Some(key) => providers.push(AnyProvider::Jooble(JoobleProvider::new(
                    http.clone(),
                    key,
                )?)),
                None => tracing::warn!(provider = %id, "No API key configured; provider disabled"),
            },
            ProviderId::Adzuna => match (&credentials.adzuna_app_id, &credentials.adzuna_app_key) {
                (Some(app_id), Some(app_key)) => {
                    providers.push(AnyProvider::Adzuna(AdzunaProvider::new(
                        http.clone(),
                        app_id,
                        app_key,
                        &credentials.country_code,
                    )?))
                }
                _ => tracing::warn!(provider = %id, "No app-id/app-key pair configured; provider disabled"),
            },
        }
    }

    if providers.is_empty() {
        return Err(AppError::ConfigError(
            "no provider has credentials configured; set JSEARCH_API_KEY, JOOBLE_API_KEY, \
             or ADZUNA_APP_ID/ADZUNA_APP_KEY"
                .into(),
        ));
    }

    Ok(providers)
}
