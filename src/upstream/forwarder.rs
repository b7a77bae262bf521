//! Forwarding of validated requests to the inference server.
//!
//! One attempt per request. The timeout covers connect through response head;
//! the body that follows may stream for as long as the model generates.

use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::request::{RequestId, X_REQUEST_ID};
use crate::security::GenerationRequest;

/// Lazy, forward-only upstream body. Not restartable.
pub type UpstreamResponseStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

pub struct UpstreamForwarder {
    client: Client,
    url: String,
    model: String,
    timeout: Duration,
}

impl UpstreamForwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        // The inference server is local; never route through an environment proxy.
        let client = Client::builder()
            .connect_timeout(config.timeout())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Outbound payload: the caller's fields with `model` and `stream` forced.
    pub fn build_payload(&self, request: GenerationRequest) -> Map<String, Value> {
        let mut payload = request.into_fields();
        payload.insert("model".to_string(), Value::String(self.model.clone()));
        payload.insert("stream".to_string(), Value::Bool(true));
        payload
    }

    pub async fn forward(
        &self,
        request: GenerationRequest,
        request_id: &RequestId,
    ) -> Result<UpstreamResponseStream, ProxyError> {
        let payload = self.build_payload(request);

        let send = self
            .client
            .post(&self.url)
            .header(X_REQUEST_ID, request_id.as_str())
            .json(&payload)
            .send();

        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(classify(e)),
            Err(_) => {
                return Err(ProxyError::UpstreamUnreachable(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                "Upstream returned error status"
            );
            return Err(ProxyError::UpstreamError {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
            });
        }

        tracing::debug!(request_id = %request_id, status = %status, "Upstream stream opened");
        Ok(response.bytes_stream().boxed())
    }
}

/// Network-level failures mean the server is unreachable; anything raised
/// while building the request is ours.
fn classify(error: reqwest::Error) -> ProxyError {
    if error.is_builder() {
        ProxyError::Internal(error.to_string())
    } else {
        ProxyError::UpstreamUnreachable(error.to_string())
    }
}
