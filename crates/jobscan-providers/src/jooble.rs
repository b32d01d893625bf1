//! Jooble adapter.
//!
//! Jooble takes a POST with a JSON payload; the API key is part of the
//! endpoint path rather than a header.

use jobscan_core::error::AppError;
use jobscan_core::models::{JobRecord, ProviderId, SearchQuery};
use jobscan_core::traits::JobProvider;

use crate::http::{ProviderHttpClient, parse_timestamp};

#[derive(Clone, Debug)]
pub struct JoobleProvider {
    http: ProviderHttpClient,
    api_key: String,
}

impl JoobleProvider {
    pub fn new(http: ProviderHttpClient, api_key: impl Into<String>) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError("JOOBLE_API_KEY must not be empty".into()));
        }
        Ok(Self { http, api_key })
    }

    fn endpoint(&self) -> String {
        format!("https://jooble.org/api/{}", self.api_key)
    }

    fn payload(query: &SearchQuery) -> serde_json::Value {
        serde_json::json!({
            "keywords": query.keywords,
            "location": query.location,
            "page": 1,
            "size": query.limit,
        })
    }

    fn parse_response(body: &str) -> Result<Vec<JobRecord>, AppError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| AppError::MalformedResponse {
                provider: ProviderId::Jooble,
                message: e.to_string(),
            })?;

        // Jooble has shipped both field names over time.
        let raw_jobs = if envelope.jobs.is_empty() {
            envelope.results
        } else {
            envelope.jobs
        };

        Ok(raw_jobs
            .into_iter()
            .map(|raw| JobRecord {
                title: raw.title.unwrap_or_default(),
                company: raw.company.unwrap_or_default(),
                location: raw.location.or(raw.city).unwrap_or_default(),
                description: raw.snippet.or(raw.description).unwrap_or_default(),
                url: raw.link.or(raw.url).unwrap_or_default(),
                source: ProviderId::Jooble,
                posted_at: parse_timestamp(raw.updated.or(raw.created).as_deref()),
            })
            .collect())
    }
}

impl JobProvider for JoobleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Jooble
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<JobRecord>, AppError> {
        let body = self
            .http
            .post_json(self.id(), &self.endpoint(), &Self::payload(query))
            .await?;
        Self::parse_response(&body)
    }
}

#[derive(serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    jobs: Vec<RawJob>,
    #[serde(default)]
    results: Vec<RawJob>,
}

#[derive(serde::Deserialize)]
struct RawJob {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    city: Option<String>,
    snippet: Option<String>,
    description: Option<String>,
    link: Option<String>,
    url: Option<String>,
    updated: Option<String>,
    created: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_query_fields() {
        let query = SearchQuery::new("rust developer", "Canada", 50).unwrap();
        let payload = JoobleProvider::payload(&query);
        assert_eq!(payload["keywords"], "rust developer");
        assert_eq!(payload["location"], "Canada");
        assert_eq!(payload["size"], 50);
    }

    #[test]
    fn test_parse_response_jobs_field() {
        let body = r#"{
            "totalCount": 1,
            "jobs": [{
                "title": "Backend Developer",
                "company": "Globex",
                "location": "Vancouver, BC",
                "snippet": "Work on services",
                "link": "https://jooble.org/jdp/123",
                "updated": "2025-08-10T00:00:00.0000000"
            }]
        }"#;
        let records = JoobleProvider::parse_response(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Globex");
        assert_eq!(records[0].url, "https://jooble.org/jdp/123");
        assert_eq!(records[0].source, ProviderId::Jooble);
        assert!(records[0].posted_at.is_some());
    }

    #[test]
    fn test_parse_response_results_field_fallback() {
        let body = r#"{"results": [{"title": "Dev", "url": "https://jooble.org/jdp/9", "city": "Ottawa"}]}"#;
        let records = JoobleProvider::parse_response(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "Ottawa");
        assert_eq!(records[0].url, "https://jooble.org/jdp/9");
    }

    #[test]
    fn test_parse_response_no_jobs_is_zero_matches() {
        let records = JoobleProvider::parse_response(r#"{"totalCount": 0}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_response_malformed_is_an_error() {
        assert!(matches!(
            JoobleProvider::parse_response("not json").unwrap_err(),
            AppError::MalformedResponse {
                provider: ProviderId::Jooble,
                ..
            }
        ));
    }

    #[test]
    fn test_api_key_in_endpoint() {
        let http = ProviderHttpClient::new(std::time::Duration::from_secs(20)).unwrap();
        let provider = JoobleProvider::new(http, "secret123").unwrap();
        assert_eq!(provider.endpoint(), "https://jooble.org/api/secret123");
    }
}
