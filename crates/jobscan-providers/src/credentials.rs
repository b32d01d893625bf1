use jobscan_core::error::AppError;

/// Provider API credentials, read once at startup.
///
/// Absent credentials disable the provider rather than failing startup;
/// [`crate::build_providers`] errors only when no provider at all is usable.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub jsearch_api_key: Option<String>,
    pub jooble_api_key: Option<String>,
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    /// Lowercase ISO country code for the country-scoped providers.
    pub country_code: String,
}

impl ProviderCredentials {
    /// Read credentials from environment variables.
    ///
    /// - `JSEARCH_API_KEY`
    /// - `JOOBLE_API_KEY`
    /// - `ADZUNA_APP_ID` (falls back to `APP_ID`) / `ADZUNA_APP_KEY`
    ///   (falls back to `APP_KEY`)
    /// - `ADZUNA_COUNTRY_CODE` (optional, defaults to "ca")
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            jsearch_api_key: non_empty_env("JSEARCH_API_KEY"),
            jooble_api_key: non_empty_env("JOOBLE_API_KEY"),
            adzuna_app_id: non_empty_env("ADZUNA_APP_ID").or_else(|| non_empty_env("APP_ID")),
            adzuna_app_key: non_empty_env("ADZUNA_APP_KEY").or_else(|| non_empty_env("APP_KEY")),
            country_code: non_empty_env("ADZUNA_COUNTRY_CODE")
                .unwrap_or_else(|| "ca".to_string())
                .to_lowercase(),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
