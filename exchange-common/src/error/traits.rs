//! Error classification traits.
//!
//! Errors self-describe whether a later attempt could succeed.

use std::time::Duration;

/// Classification of error types for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// May resolve on a later attempt (network hiccups, timeouts)
    Transient,
    /// Will not resolve on retry (bad input, malformed server data)
    Permanent,
    /// Server-side throttling or ban
    ResourceExhausted,
    /// Missing credentials, bad settings
    Configuration,
    /// Unexpected state
    Internal,
}

/// Trait for errors that can classify themselves.
pub trait ErrorClassification {
    /// Returns the category of this error
    fn category(&self) -> ErrorCategory;

    /// Returns true if this error may succeed on a later attempt
    fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::ResourceExhausted
        )
    }

    /// Returns true if this error won't succeed on retry
    fn is_permanent(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permanent)
    }

    /// Suggests a delay before a later attempt, if applicable
    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self.category() {
            ErrorCategory::Transient => Some(Duration::from_millis(100)),
            ErrorCategory::ResourceExhausted => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}
