//! LLM proxy.
//!
//! ```text
//!     Client (browser)                                              Inference server
//!          │                                                               ▲
//!          ▼                                                               │
//!   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//!   │ http server │──▶│ rate limiter │──▶│  validator  │──▶│ upstream forward │
//!   │ CORS, req ID│   │ per-IP window│   │ JSON, prompt│   │ model + stream   │
//!   └─────────────┘   └──────────────┘   └─────────────┘   └────────┬─────────┘
//!          ▲                                                        │
//!          │                 ┌──────────────┐                       │
//!          └─────────────────│ stream relay │◀──────────────────────┘
//!                            │ ≤1 KiB chunks│
//!                            └──────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use llm_proxy::cli::Cli;
use llm_proxy::http::HttpServer;
use llm_proxy::lifecycle::Shutdown;
use llm_proxy::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);
    tracing::info!("llm-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        model = %config.upstream.model,
        rate_limit = config.rate_limit.requests_per_minute,
        prompt_validation = config.security.prompt_validation,
        "Configuration loaded"
    );
    if config.upstream.chunk_timeout_secs.is_none() {
        tracing::warn!("No per-chunk upstream timeout configured; a stalled upstream holds its client connection open");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(shutdown.trigger_on_signal());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
