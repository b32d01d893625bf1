use thiserror::Error;

use crate::models::ProviderId;

/// Application-wide error types for jobscan.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed before a status was received.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Upstream provider returned a non-2xx status.
    #[error("provider {provider} returned HTTP {status}")]
    ProviderStatus { provider: ProviderId, status: u16 },

    /// Provider response body could not be parsed into job records.
    #[error("malformed response from {provider}: {message}")]
    MalformedResponse {
        provider: ProviderId,
        message: String,
    },

    /// Provider rejected our credentials.
    #[error("authentication rejected by {provider}")]
    AuthRejected { provider: ProviderId },

    /// Request timed out.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Local rate-limit budget exhausted for a provider.
    #[error("rate limit exhausted for {0}")]
    RateLimited(ProviderId),

    /// Network/connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A search query failed validation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true if this error belongs to the provider failure class:
    /// the orchestrator recovers from it via fallback, it never reaches callers.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::ProviderStatus { .. }
                | AppError::MalformedResponse { .. }
                | AppError::AuthRejected { .. }
                | AppError::Timeout(_)
                | AppError::RateLimited(_)
                | AppError::NetworkError(_)
        )
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}
