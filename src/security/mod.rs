//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming generate request:
//!     → rate_limit.rs (per-IP sliding window)
//!     → validation.rs (content type, JSON object, safe prompt)
//!     → Pass to upstream forwarder
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Rate limiting runs first, so malformed floods are throttled too

pub mod rate_limit;
pub mod validation;

pub use rate_limit::{RateLimiter, WindowSweeper};
pub use validation::{GenerationRequest, RequestValidator};
