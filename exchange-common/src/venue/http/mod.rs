//! HTTP client infrastructure for venues.
//!
//! This module provides venue-agnostic HTTP client components:
//!
//! - [`RequestSigner`]: Trait for request signing
//! - [`RateLimiter`]: Client-side request weight limiting
//! - [`ThrottleState`]: Per-call handling of 429/418 backoff hints
//! - [`HttpClient`]: Authenticated HTTP client tying the above together

mod client;
mod rate_limiter;
mod retry;
mod signer;

pub use client::{HttpClient, RECV_WINDOW_PARAM};
pub use rate_limiter::RateLimiter;
pub use retry::{
    is_throttle_status, parse_retry_after, AttemptOutcome, FatalReason, ThrottleState,
    STATUS_IP_BANNED, STATUS_TOO_MANY_REQUESTS,
};
pub use signer::{
    build_query_string, strip_auth_params, RequestSigner, SIGNATURE_PARAM, TIMESTAMP_PARAM,
};
