//! Upstream inference server subsystem.
//!
//! # Data Flow
//! ```text
//! GenerationRequest
//!     → forwarder.rs (force model + stream, POST with first-byte timeout)
//!     → UpstreamResponseStream (lazy byte chunks)
//!     → relay.rs (UTF-8 safe, size-capped chunks, pulled by the client)
//!     → response body
//! ```
//!
//! # Design Decisions
//! - No retries: a single attempt per incoming request
//! - No per-chunk timeout unless configured
//! - Client disconnect drops the relay, which drops the upstream connection

pub mod forwarder;
pub mod relay;

pub use forwarder::{UpstreamForwarder, UpstreamResponseStream};
pub use relay::{relay, RelayOptions};
