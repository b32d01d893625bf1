//! Adzuna adapter.
//!
//! Adzuna wants an app-id/app-key pair as query parameters and scopes the
//! endpoint by a lowercase ISO country code in the path.

use jobscan_core::error::AppError;
use jobscan_core::models::{JobRecord, ProviderId, SearchQuery};
use jobscan_core::traits::JobProvider;

use crate::http::{ProviderHttpClient, parse_timestamp};

/// Only postings from the last two weeks; older listings are mostly stale.
const MAX_DAYS_OLD: &str = "14";

#[derive(Clone, Debug)]
pub struct AdzunaProvider {
    http: ProviderHttpClient,
    app_id: String,
    app_key: String,
    country_code: String,
}

impl AdzunaProvider {
    pub fn new(
        http: ProviderHttpClient,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, AppError> {
        let app_id = app_id.into();
        let app_key = app_key.into();
        if app_id.trim().is_empty() || app_key.trim().is_empty() {
            return Err(AppError::ConfigError(
                "ADZUNA_APP_ID and ADZUNA_APP_KEY must both be set".into(),
            ));
        }
        Ok(Self {
            http,
            app_id,
            app_key,
            country_code: country_code.into().to_lowercase(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.adzuna.com/v1/api/jobs/{}/search/1",
            self.country_code
        )
    }

    fn request_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        vec![
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
            ("what", query.keywords.clone()),
            ("where", query.location.clone()),
            ("results_per_page", query.limit.to_string()),
            ("max_days_old", MAX_DAYS_OLD.to_string()),
            ("sort_by", "date".to_string()),
        ]
    }

    fn parse_response(body: &str, country_code: &str) -> Result<Vec<JobRecord>, AppError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| AppError::MalformedResponse {
                provider: ProviderId::Adzuna,
                message: e.to_string(),
            })?;

        let country = country_code.to_uppercase();
        Ok(envelope
            .results
            .into_iter()
            .map(|raw| {
                // Adzuna reports location as an area path, country first.
                let city = raw
                    .location
                    .and_then(|l| l.area.last().cloned())
                    .unwrap_or_default();
                let location = [city, country.clone()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");

                JobRecord {
                    title: raw.title.unwrap_or_default(),
                    company: raw.company.and_then(|c| c.display_name).unwrap_or_default(),
                    location,
                    description: raw.description.unwrap_or_default(),
                    url: raw.redirect_url.unwrap_or_default(),
                    source: ProviderId::Adzuna,
                    posted_at: parse_timestamp(raw.created.as_deref()),
                }
            })
            .collect())
    }
}

impl JobProvider for AdzunaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Adzuna
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<JobRecord>, AppError> {
        let body = self
            .http
            .get(self.id(), &self.endpoint(), &[], &self.request_params(query))
            .await?;
        Self::parse_response(&body, &self.country_code)
    }
}

#[derive(serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Vec<RawJob>,
}

#[derive(serde::Deserialize)]
struct RawJob {
    title: Option<String>,
    company: Option<RawCompany>,
    location: Option<RawLocation>,
    description: Option<String>,
    redirect_url: Option<String>,
    created: Option<String>,
}

#[derive(serde::Deserialize)]
struct RawCompany {
    display_name: Option<String>,
}

#[derive(serde::Deserialize)]
struct RawLocation {
    #[serde(default)]
    area: Vec<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn provider() -> AdzunaProvider {
        AdzunaProvider::new(
            ProviderHttpClient::new(Duration::from_secs(20)).unwrap(),
            "app-id",
            "app-key",
            "CA",
        )
        .unwrap()
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let http = ProviderHttpClient::new(Duration::from_secs(20)).unwrap();
        assert!(AdzunaProvider::new(http.clone(), "", "key", "ca").is_err());
        assert!(AdzunaProvider::new(http, "id", "", "ca").is_err());
    }

    #[test]
    fn test_endpoint_uses_lowercase_country() {
        assert_eq!(
            provider().endpoint(),
            "https://api.adzuna.com/v1/api/jobs/ca/search/1"
        );
    }

    #[test]
    fn test_request_params_shape() {
        let query = SearchQuery::new("rust developer", "Toronto", 25).unwrap();
        let params = provider().request_params(&query);
        assert!(params.contains(&("what", "rust developer".to_string())));
        assert!(params.contains(&("where", "Toronto".to_string())));
        assert!(params.contains(&("results_per_page", "25".to_string())));
        assert!(params.contains(&("sort_by", "date".to_string())));
    }

    #[test]
    fn test_parse_response_normalizes_records() {
        let body = r#"{
            "count": 1,
            "results": [{
                "title": "Backend Developer",
                "company": {"display_name": "Initech"},
                "location": {"area": ["Canada", "Ontario", "Toronto"]},
                "description": "Build APIs",
                "redirect_url": "https://adzuna.com/land/ad/1",
                "created": "2025-08-12T08:00:00Z"
            }]
        }"#;
        let records = AdzunaProvider::parse_response(body, "ca").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Initech");
        assert_eq!(records[0].location, "Toronto, CA");
        assert_eq!(records[0].source, ProviderId::Adzuna);
        assert!(records[0].posted_at.is_some());
    }

    #[test]
    fn test_parse_response_missing_area_keeps_country() {
        let body = r#"{"results": [{"title": "Dev", "redirect_url": "https://adzuna.com/1"}]}"#;
        let records = AdzunaProvider::parse_response(body, "ca").unwrap();
        assert_eq!(records[0].location, "CA");
    }

    #[test]
    fn test_parse_response_malformed_is_an_error() {
        assert!(matches!(
            AdzunaProvider::parse_response("{]", "ca").unwrap_err(),
            AppError::MalformedResponse {
                provider: ProviderId::Adzuna,
                ..
            }
        ));
    }
}
