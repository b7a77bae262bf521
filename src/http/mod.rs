//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request ID, client key)
//!     → [security: rate limit, validation]
//!     → [upstream: forward, relay]
//!     → response.rs (streamed text/plain body)
//!     → Send to client
//! ```

pub mod help;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
