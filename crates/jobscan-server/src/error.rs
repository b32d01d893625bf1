use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobscan_core::error::AppError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self.0 {
            AppError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "invalid_query"),
            AppError::SerializationError(_) => (StatusCode::BAD_REQUEST, "serialization_error"),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::HttpError(_)
            | AppError::NetworkError(_)
            | AppError::ProviderStatus { .. }
            | AppError::MalformedResponse { .. }
            | AppError::AuthRejected { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.0.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscan_core::models::ProviderId;

    fn status_of(err: AppError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_invalid_query_is_bad_request() {
        assert_eq!(
            status_of(AppError::InvalidQuery("empty keywords".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        assert_eq!(
            status_of(AppError::RateLimited(ProviderId::JSearch)),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_provider_failures_are_bad_gateway() {
        assert_eq!(
            status_of(AppError::ProviderStatus {
                provider: ProviderId::Jooble,
                status: 500,
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AppError::AuthRejected {
                provider: ProviderId::Adzuna,
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        assert_eq!(status_of(AppError::Timeout(20)), StatusCode::GATEWAY_TIMEOUT);
    }
}
