//! Throttle handling for a single logical API call.
//!
//! One [`ThrottleState`] lives for exactly one logical call. The HTTP client
//! drives it with an explicit loop:
//!
//! ```text
//! READY -> SENT -> SUCCESS
//!               -> THROTTLED -> (sleep) -> READY
//!               -> FATAL
//! ```
//!
//! A 429 or 418 response is THROTTLED when its `Retry-After` hint is within
//! the configured ceiling and attempts remain; a hint above the ceiling is
//! FATAL straight away, without sleeping and without using up an attempt.

use std::time::Duration;

use crate::venue::config::RetryConfig;

/// HTTP status Binance uses for "too many requests".
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// HTTP status Binance uses once an IP is auto-banned for ignoring 429s.
pub const STATUS_IP_BANNED: u16 = 418;

/// Returns true for statuses that carry a backoff hint.
pub fn is_throttle_status(status: u16) -> bool {
    status == STATUS_TOO_MANY_REQUESTS || status == STATUS_IP_BANNED
}

/// Parse a `Retry-After` header value given in whole seconds.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Why a call ended in the FATAL state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// A non-success status that is not a throttle
    Status,
    /// Server asked for a wait above the ceiling
    RetryAfterTooLong {
        /// Requested wait
        retry_after: Duration,
        /// Configured ceiling
        limit: Duration,
    },
    /// Throttled on the last allowed attempt
    AttemptsExhausted,
}

/// Transition taken after a response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx; hand the body to the caller
    Success,
    /// Sleep for `wait`, then send again with a fresh signature
    Retry {
        /// Backoff requested by the server
        wait: Duration,
    },
    /// Surface an error to the caller
    Fatal(FatalReason),
}

/// Per-call retry bookkeeping.
#[derive(Debug, Clone)]
pub struct ThrottleState {
    attempts: u32,
    total_backoff: Duration,
    max_attempts: u32,
    retry_after_limit: Duration,
    default_retry_after: Duration,
}

impl ThrottleState {
    /// Fresh state for a new logical call.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            attempts: 0,
            total_backoff: Duration::ZERO,
            max_attempts: config.max_attempts.max(1),
            retry_after_limit: config.retry_after_limit(),
            default_retry_after: config.default_retry_after(),
        }
    }

    /// Record a response and decide the next transition.
    ///
    /// `retry_after` is the raw header value, if the response had one.
    pub fn on_response(&mut self, status: u16, retry_after: Option<&str>) -> AttemptOutcome {
        self.attempts += 1;

        if (200..300).contains(&status) {
            return AttemptOutcome::Success;
        }

        if !is_throttle_status(status) {
            return AttemptOutcome::Fatal(FatalReason::Status);
        }

        let wait = parse_retry_after(retry_after).unwrap_or(self.default_retry_after);
        if wait > self.retry_after_limit {
            return AttemptOutcome::Fatal(FatalReason::RetryAfterTooLong {
                retry_after: wait,
                limit: self.retry_after_limit,
            });
        }

        if self.attempts >= self.max_attempts {
            return AttemptOutcome::Fatal(FatalReason::AttemptsExhausted);
        }

        self.total_backoff += wait;
        AttemptOutcome::Retry { wait }
    }

    /// Requests sent so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sum of the waits granted so far.
    pub fn total_backoff(&self) -> Duration {
        self.total_backoff
    }
}
