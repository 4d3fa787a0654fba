use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_engine::UpstreamError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("{0}")]
    InvalidParam(String),
    #[error("path traversal not allowed")]
    InvalidPath,
    #[error("host not allowed")]
    HostNotAllowed,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("upstream request timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) | ApiError::InvalidParam(_) | ApiError::InvalidPath => {
                StatusCode::BAD_REQUEST
            }
            ApiError::HostNotAllowed => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Propagate the upstream code when it is a valid status,
            // otherwise shield behind 502.
            ApiError::Upstream(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::TooManyRedirects => StatusCode::BAD_GATEWAY,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::MissingParam(_) => "missing_parameters",
            ApiError::InvalidParam(_) => "invalid_parameters",
            ApiError::InvalidPath => "invalid_path",
            ApiError::HostNotAllowed => "host_not_allowed",
            ApiError::RateLimited => "rate_limit_exceeded",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::TooManyRedirects => "too_many_redirects",
            ApiError::Timeout => "upstream_timeout",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidUrl(message) => ApiError::InvalidParam(message),
            UpstreamError::HostNotAllowed(_) => ApiError::HostNotAllowed,
            UpstreamError::TooManyRedirects { .. } => ApiError::TooManyRedirects,
            UpstreamError::Status(code) => ApiError::Upstream(code),
            UpstreamError::Timeout => ApiError::Timeout,
            UpstreamError::Network(message) => ApiError::Internal(message),
            UpstreamError::Cancelled => ApiError::Internal("cancelled".to_string()),
            UpstreamError::Persist(err) => ApiError::Internal(err.to_string()),
        }
    }
}
