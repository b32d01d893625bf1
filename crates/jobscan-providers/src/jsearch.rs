//! JSearch (RapidAPI) adapter.

use jobscan_core::error::AppError;
use jobscan_core::models::{JobRecord, ProviderId, SearchQuery};
use jobscan_core::traits::JobProvider;

use crate::http::{ProviderHttpClient, parse_timestamp};

const BASE_URL: &str = "https://jsearch.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";

#[derive(Clone, Debug)]
pub struct JSearchProvider {
    http: ProviderHttpClient,
    api_key: String,
    country_code: String,
}

impl JSearchProvider {
    pub fn new(
        http: ProviderHttpClient,
        api_key: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError("JSEARCH_API_KEY must not be empty".into()));
        }
        Ok(Self {
            http,
            api_key,
            country_code: country_code.into(),
        })
    }

    fn request_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.keywords.clone()),
            ("page", "1".to_string()),
            ("num_pages", "1".to_string()),
            ("country", self.country_code.clone()),
        ];
        if let Some(employment_types) = query.filters.get("employment_types") {
            params.push(("employment_types", employment_types.clone()));
        }
        params
    }

    fn parse_response(body: &str) -> Result<Vec<JobRecord>, AppError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| AppError::MalformedResponse {
                provider: ProviderId::JSearch,
                message: e.to_string(),
            })?;

        Ok(envelope
            .data
            .into_iter()
            .map(|raw| {
                let location = [
                    raw.job_city.unwrap_or_default(),
                    raw.job_country.unwrap_or_default(),
                ]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", ");

                JobRecord {
                    title: raw.job_title.unwrap_or_default(),
                    company: raw.employer_name.unwrap_or_default(),
                    location,
                    description: raw.job_description.unwrap_or_default(),
                    url: raw.job_apply_link.unwrap_or_default(),
                    source: ProviderId::JSearch,
                    posted_at: parse_timestamp(raw.job_posted_at_datetime_utc.as_deref()),
                }
            })
            .collect())
    }
}

impl JobProvider for JSearchProvider {
    fn id(&self) -> ProviderId {
        ProviderId::JSearch
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<JobRecord>, AppError> {
        let headers = [
            ("X-RapidAPI-Key", self.api_key.as_str()),
            ("X-RapidAPI-Host", RAPIDAPI_HOST),
        ];
        let body = self
            .http
            .get(self.id(), BASE_URL, &headers, &self.request_params(query))
            .await?;
        Self::parse_response(&body)
    }
}

#[derive(serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<RawJob>,
}

#[derive(serde::Deserialize)]
struct RawJob {
    job_title: Option<String>,
    employer_name: Option<String>,
    job_city: Option<String>,
    job_country: Option<String>,
    job_description: Option<String>,
    job_apply_link: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
}
