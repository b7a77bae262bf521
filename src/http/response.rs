//! Response construction for the generate endpoint.
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Errors before the first byte become JSON error bodies (see `ProxyError`)
//! - Errors after the first byte can only truncate the stream

use std::io;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::Stream;

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Wrap a relayed body stream in a `200 text/plain` response.
pub fn streaming_response<S>(body: S) -> Response
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8))
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        .header("x-accel-buffering", HeaderValue::from_static("no"))
        .body(Body::from_stream(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
