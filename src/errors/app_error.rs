//! HTTP-facing error type.
//!
//! Every failure a handler can return renders as
//! `{"error": <code>, "message": <text>}` with a status that tells local
//! rejections (4xx) apart from upstream failures (5xx).

use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::credentials::CredentialError;
use crate::core::gateway::GatewayError;
use crate::core::tts::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] CredentialError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        Self::Gateway(GatewayError::Upstream(err))
    }
}

/// Whole seconds for a `Retry-After` header, never zero.
pub fn retry_after_seconds(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Gateway(GatewayError::InvalidInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Gateway(GatewayError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Gateway(GatewayError::NoCredential) => StatusCode::PRECONDITION_FAILED,
            Self::Gateway(GatewayError::Upstream(ProviderError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Gateway(GatewayError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            Self::InvalidCredential(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Gateway(GatewayError::InvalidInput(_)) => "invalid_input",
            Self::Gateway(GatewayError::RateLimited { .. }) => "rate_limited",
            Self::Gateway(GatewayError::NoCredential) => "no_credential",
            Self::Gateway(GatewayError::Upstream(ProviderError::Timeout(_))) => "upstream_timeout",
            Self::Gateway(GatewayError::Upstream(_)) => "upstream_error",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });

        let mut retry_header = None;
        match &self {
            Self::Gateway(GatewayError::RateLimited { retry_after }) => {
                let secs = retry_after_seconds(*retry_after);
                body["retry_after_seconds"] = json!(secs);
                retry_header = Some(secs);
            }
            Self::Gateway(GatewayError::Upstream(err)) => {
                body["retryable"] = json!(err.is_retryable());
                body["kind"] = json!(err.kind());
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                body["message"] = json!("Internal server error");
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_header {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_seconds(Duration::from_secs(60)), 60);
        assert_eq!(retry_after_seconds(Duration::from_millis(59_001)), 60);
        assert_eq!(retry_after_seconds(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_seconds(Duration::ZERO), 1);
    }

    #[test]
    fn test_status_codes() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (GatewayError::InvalidInput("x".into()).into(), StatusCode::BAD_REQUEST),
            (
                GatewayError::RateLimited {
                    retry_after: Duration::from_secs(1),
                }
                .into(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (GatewayError::NoCredential.into(), StatusCode::PRECONDITION_FAILED),
            (ProviderError::Auth("x".into()).into(), StatusCode::BAD_GATEWAY),
            (
                ProviderError::Timeout(Duration::from_secs(30)).into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                CredentialError::MissingField("private_key").into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound("entry".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn test_rate_limited_response_has_retry_after_header() {
        let response = AppError::from(GatewayError::RateLimited {
            retry_after: Duration::from_millis(30_500),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "31");
    }
}
