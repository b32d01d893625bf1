//! Shared HTTP transport for provider adapters.
//!
//! One reqwest client with a bounded per-request timeout, plus a retry
//! policy for transient upstream trouble: 429 and 5xx responses are retried
//! with exponential backoff, honoring a numeric `Retry-After` header when
//! the provider sends one. Anything still failing after the final attempt
//! surfaces as an [`AppError`] for the orchestrator's fallback path.

use std::time::Duration;

use jobscan_core::error::AppError;
use jobscan_core::models::ProviderId;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

const USER_AGENT: &str = "jobscan/0.1 (job aggregator)";
const MAX_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// HTTP client shared by all provider adapters.
#[derive(Clone, Debug)]
pub struct ProviderHttpClient {
    client: Client,
    timeout_secs: u64,
}

impl ProviderHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// GET with provider-specific headers and query parameters.
    pub async fn get(
        &self,
        provider: ProviderId,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<String, AppError> {
        self.execute(provider, || {
            let mut request = self.client.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request
        })
        .await
    }

    /// POST with a JSON body.
    pub async fn post_json(
        &self,
        provider: ProviderId,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<String, AppError> {
        self.execute(provider, || self.client.post(url).json(body)).await
    }

    async fn execute(
        &self,
        provider: ProviderId,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<String, AppError> {
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            let response = match build().send().await {
                Ok(response) => response,
                Err(e) => {
                    let mapped = self.map_send_error(e);
                    if attempt == MAX_ATTEMPTS || !mapped.is_retryable() {
                        return Err(mapped);
                    }
                    tracing::debug!(%provider, attempt, error = %mapped, "Request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempt == MAX_ATTEMPTS {
                    return Err(AppError::ProviderStatus {
                        provider,
                        status: status.as_u16(),
                    });
                }
                let wait = retry_after(&response).unwrap_or(backoff);
                tracing::debug!(
                    %provider,
                    attempt,
                    status = status.as_u16(),
                    wait_ms = wait.as_millis() as u64,
                    "Upstream busy, backing off"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(AppError::AuthRejected { provider });
            }
            if !status.is_success() {
                return Err(AppError::ProviderStatus {
                    provider,
                    status: status.as_u16(),
                });
            }

            return response
                .text()
                .await
                .map_err(|e| AppError::HttpError(format!("failed to read response body: {e}")));
        }

        Err(AppError::HttpError("retry attempts exhausted".into()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

/// Numeric `Retry-After` in seconds, when present and parseable.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Best-effort RFC 3339 timestamp parsing for provider payloads.
///
/// Providers disagree on timestamp shape; anything unparseable becomes
/// `None` rather than failing the whole response.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .ok()
        .or_else(|| {
            // Some providers send naive datetimes ("2025-08-01T09:30:00").
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp(Some("2025-08-01T09:30:00Z")).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-08-01T09:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_naive() {
        assert!(parse_timestamp(Some("2025-08-01T09:30:00.0000000")).is_some());
    }

    #[test]
    fn test_parse_timestamp_garbage_is_none() {
        assert!(parse_timestamp(Some("yesterday")).is_none());
        assert!(parse_timestamp(Some("")).is_none());
        assert!(parse_timestamp(None).is_none());
    }
}
