//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with both endpoints
//! - Wire up middleware (CORS, request ID, tracing, request deadline, body limit)
//! - Bind server to listener with client address info
//! - Run the generate pipeline: rate limit → validate → forward → relay
//! - Keep the rate limiter's memory bounded (window sweeper)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        ConnectInfo, DefaultBodyLimit, State,
    },
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, ProxyConfig};
use crate::error::ProxyError;
use crate::http::help::help_document;
use crate::http::request::{client_key, x_request_id, MakeRequestUuid, RequestId};
use crate::http::response::streaming_response;
use crate::observability::metrics;
use crate::observability::tracing::make_request_span;
use crate::security::{RateLimiter, RequestValidator, WindowSweeper};
use crate::upstream::{relay, RelayOptions, UpstreamForwarder};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub limiter: Arc<RateLimiter>,
    pub validator: RequestValidator,
    pub forwarder: Arc<UpstreamForwarder>,
    pub relay_options: RelayOptions,
    pub help: Arc<Value>,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let forwarder = UpstreamForwarder::new(&config.upstream)?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            validator: RequestValidator::new(config.security.prompt_validation),
            forwarder: Arc::new(forwarder),
            relay_options: RelayOptions::from_config(&config.upstream),
            help: Arc::new(help_document(&config)),
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the LLM proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::new(config)?;
        let router = build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.state.forwarder.url(),
            model = %self.state.config.upstream.model,
            rate_limit = self.state.limiter.limit(),
            "HTTP server starting"
        );

        let sweeper = WindowSweeper::new(
            self.state.limiter.clone(),
            Duration::from_secs(self.state.config.rate_limit.sweep_interval_secs),
        );
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for in-process testing without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/help", get(help_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(Duration::from_secs(config.timeouts.request_secs)),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id()))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(SetRequestIdLayer::new(x_request_id(), MakeRequestUuid))
        .layer(build_cors_layer(&config.cors))
}

/// Build CORS layer from configuration. No origins configured means any.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let allowed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Render errors raised by the middleware stack with the usual JSON body.
async fn handle_middleware_error(err: BoxError) -> ProxyError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the server deadline");
        ProxyError::RequestTimeout
    } else {
        ProxyError::Internal(err.to_string())
    }
}

async fn help_handler(State(state): State<AppState>) -> Json<Value> {
    Json(state.help.as_ref().clone())
}

/// `POST /api/generate`.
async fn generate_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = RequestId::from_headers(&headers);
    let client = client_key(&addr);

    let response = match generate(&state, &client, &request_id, &headers, body).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ProxyError::UpstreamUnreachable(_) | ProxyError::Internal(_) => {
                    tracing::error!(request_id = %request_id, client = %client, error = %e, "Generate request failed")
                }
                _ => {
                    tracing::warn!(request_id = %request_id, client = %client, reason = e.kind(), "Generate request rejected")
                }
            }
            e.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn generate(
    state: &AppState,
    client: &str,
    request_id: &RequestId,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    if !state.limiter.allow(client) {
        return Err(ProxyError::RateLimited);
    }

    let body = body.map_err(|rejection| match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            ProxyError::PayloadTooLarge {
                limit: state.config.security.max_body_size,
            }
        }
        other => {
            tracing::debug!(request_id = %request_id, error = %other.body_text(), "Failed to read request body");
            ProxyError::InvalidFormat
        }
    })?;

    let request = state.validator.validate(headers, &body)?;

    tracing::info!(
        request_id = %request_id,
        client = %client,
        prompt_chars = request.prompt().chars().count(),
        "Generate request admitted"
    );
    if tracing::enabled!(tracing::Level::DEBUG) {
        let payload = serde_json::to_string(request.fields())
            .map_err(|e| ProxyError::Internal(e.to_string()))?;
        tracing::debug!(request_id = %request_id, payload = %payload, "Validated payload");
    }

    let upstream = state.forwarder.forward(request, request_id).await?;
    Ok(streaming_response(relay(upstream, state.relay_options)))
}
