//! Call-level venue errors.
//!
//! A [`VenueError`] aborts the logical API call that produced it (and, for a
//! windowed fetch, every remaining sub-window). Per-record problems never
//! surface here; see [`crate::venue::RecordError`].

use std::time::Duration;
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Result type for venue operations.
pub type VenueResult<T> = Result<T, VenueError>;

/// Errors that abort a venue call.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum VenueError {
    /// Non-success HTTP status, or throttling that could not be waited out
    #[error("{endpoint} failed with HTTP status code: {status}. {message}")]
    Remote {
        /// Endpoint path that failed
        endpoint: String,
        /// HTTP status of the last response
        status: u16,
        /// Response body, or the Binance `code`/`msg` pair when present
        message: String,
    },

    /// Throttled and the server asked for a longer wait than we accept
    #[error("{endpoint} failed with HTTP status code: {status}. {message}. Retry after {retry_after:?} exceeds limit {limit:?}")]
    RetryAfterTooLong {
        /// Endpoint path that was throttled
        endpoint: String,
        /// 429 or 418
        status: u16,
        /// Response body, or the Binance `code`/`msg` pair when present
        message: String,
        /// Wait requested by the server
        retry_after: Duration,
        /// Configured ceiling
        limit: Duration,
    },

    /// Transport failure (connect, timeout, body read)
    #[error("Request error: {0}")]
    Request(String),

    /// Malformed top-level response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing credentials or invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (reversed range, zero span)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorClassification for VenueError {
    fn category(&self) -> ErrorCategory {
        match self {
            VenueError::Remote { status, .. } => match status {
                418 | 429 => ErrorCategory::ResourceExhausted,
                401 | 403 => ErrorCategory::Configuration,
                500..=599 => ErrorCategory::Transient,
                _ => ErrorCategory::Permanent,
            },
            VenueError::RetryAfterTooLong { .. } => ErrorCategory::ResourceExhausted,
            VenueError::Request(_) => ErrorCategory::Transient,
            VenueError::Parse(_) => ErrorCategory::Permanent,
            VenueError::Configuration(_) => ErrorCategory::Configuration,
            VenueError::InvalidRequest(_) => ErrorCategory::Permanent,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            VenueError::RetryAfterTooLong { retry_after, .. } => Some(*retry_after),
            VenueError::Remote { status: 418 | 429, .. } => Some(Duration::from_secs(60)),
            VenueError::Request(_) => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

impl VenueError {
    /// Create a remote error for an endpoint.
    pub fn remote(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            VenueError::Remote { status, .. } | VenueError::RetryAfterTooLong { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Returns true if the failure was caused by server throttling.
    pub fn is_throttled(&self) -> bool {
        matches!(self.status(), Some(418 | 429))
    }
}

impl From<reqwest::Error> for VenueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VenueError::Request(format!("timeout: {}", err))
        } else {
            VenueError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_names_endpoint_and_status() {
        let err = VenueError::remote("myTrades", 418, "[]");
        assert!(err
            .to_string()
            .contains("myTrades failed with HTTP status code: 418"));
        assert!(err.is_throttled());
        assert_eq!(err.category(), ErrorCategory::ResourceExhausted);
    }

    #[test]
    fn test_retry_after_too_long_keeps_status() {
        let err = VenueError::RetryAfterTooLong {
            endpoint: "myTrades".to_string(),
            status: 418,
            message: "Error code: -1003 and error message: banned".to_string(),
            retry_after: Duration::from_secs(61),
            limit: Duration::from_secs(60),
        };
        assert_eq!(err.status(), Some(418));
        assert!(err.to_string().contains("Error code: -1003"));
        assert_eq!(err.suggested_retry_delay(), Some(Duration::from_secs(61)));
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let err = VenueError::remote("capital/deposit/hisrec", 400, "bad request");
        assert!(err.is_permanent());
        assert!(!err.is_throttled());

        let err = VenueError::remote("account", 401, "invalid key");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = VenueError::remote("exchangeInfo", 503, "maintenance");
        assert!(err.is_transient());
    }
}
