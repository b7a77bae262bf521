//! Error taxonomy for the generate pipeline.
//!
//! Every variant is terminal for the request that produced it. The client only
//! ever sees the short public message; the detail carried by `Internal` and
//! `UpstreamUnreachable` is for the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("content type is not application/json")]
    InvalidContentType,

    #[error("request body is not a JSON object")]
    InvalidFormat,

    #[error("prompt is missing, not text, or contains disallowed characters")]
    InvalidPrompt,

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request did not complete within the server deadline")]
    RequestTimeout,

    #[error("client exceeded its request window")]
    RateLimited,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream returned status {status}")]
    UpstreamError { status: StatusCode },

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body sent for every rejected request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl ProxyError {
    /// HTTP status the client receives.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidContentType
            | ProxyError::InvalidFormat
            | ProxyError::InvalidPrompt => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamError { status } => *status,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::InvalidContentType => {
                "Invalid content type. Only application/json is allowed."
            }
            ProxyError::InvalidFormat => "Invalid request format",
            ProxyError::InvalidPrompt => "Invalid prompt format",
            ProxyError::PayloadTooLarge { .. } => "Request body too large",
            ProxyError::RequestTimeout => "Request timed out",
            ProxyError::RateLimited => "Rate limit exceeded",
            ProxyError::UpstreamUnreachable(_) => "LLM server unreachable",
            ProxyError::UpstreamError { .. } => "LLM server response error",
            ProxyError::Internal(_) => "Internal server error",
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidContentType => "invalid_content_type",
            ProxyError::InvalidFormat => "invalid_format",
            ProxyError::InvalidPrompt => "invalid_prompt",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::RequestTimeout => "request_timeout",
            ProxyError::RateLimited => "rate_limited",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
            ProxyError::UpstreamError { .. } => "upstream_error",
            ProxyError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        metrics::record_rejection(self.kind());
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
