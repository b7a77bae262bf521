//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rate limit > 0, timeouts > 0)
//! - Keep the request deadline above the upstream first-byte timeout
//! - Check the upstream URL and listener address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.url '{0}' is not a valid http(s) URL")]
    UpstreamUrl(String),

    #[error("upstream.model must not be empty")]
    EmptyModel,

    #[error("upstream.timeout_secs must be positive")]
    ZeroTimeout,

    #[error("upstream.chunk_size must be positive")]
    ZeroChunkSize,

    #[error("upstream.chunk_timeout_secs must be positive when set")]
    ZeroChunkTimeout,

    #[error("rate_limit.requests_per_minute must be a positive integer")]
    ZeroRateLimit,

    #[error("rate_limit.window_secs must be positive")]
    ZeroWindow,

    #[error("rate_limit.sweep_interval_secs must be positive")]
    ZeroSweepInterval,

    #[error("timeouts.request_secs must be positive")]
    ZeroRequestTimeout,

    #[error("timeouts.request_secs ({request_secs}) must exceed upstream.timeout_secs ({upstream_secs})")]
    RequestTimeoutTooShort { request_secs: u64, upstream_secs: u64 },

    #[error("cors.allowed_origins entry '{0}' is not a valid origin (leave the list empty to allow any)")]
    CorsOrigin(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let upstream = &config.upstream;
    match url::Url::parse(&upstream.url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::UpstreamUrl(upstream.url.clone())),
    }
    if upstream.model.trim().is_empty() {
        errors.push(ValidationError::EmptyModel);
    }
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if upstream.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }
    if upstream.chunk_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroChunkTimeout);
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.requests_per_minute == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }
    if rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    let request_secs = config.timeouts.request_secs;
    if request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    } else if request_secs <= upstream.timeout_secs {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs,
            upstream_secs: upstream.timeout_secs,
        });
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::CorsOrigin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
