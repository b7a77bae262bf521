//! LLM proxy library.
//!
//! Forwards generation requests from browser clients to a local inference
//! server, adding CORS, per-client rate limiting and prompt validation, and
//! relays the streamed reply chunk by chunk.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
