//! Configuration types for venue REST clients.
//!
//! These types are designed to be deserialized from TOML configuration files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base configuration for any venue client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VenueConfig {
    /// REST API configuration
    #[serde(default)]
    pub rest: RestConfig,
    /// Throttle handling
    #[serde(default)]
    pub retry: RetryConfig,
    /// Client-side request weight limiting
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL for the REST API (empty means the venue default)
    #[serde(default)]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Receive window in milliseconds (for timestamp validation)
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_recv_window_ms() -> u64 {
    10_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: default_timeout_ms(),
            recv_window_ms: default_recv_window_ms(),
        }
    }
}

impl RestConfig {
    /// Returns the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Throttle (HTTP 429/418) handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per logical call, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Longest `Retry-After` we are willing to sleep for
    #[serde(default = "default_retry_after_limit_secs")]
    pub retry_after_limit_secs: u64,
    /// Wait used when the server omits `Retry-After`
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_after_limit_secs() -> u64 {
    60
}

fn default_retry_after_secs() -> u64 {
    1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_after_limit_secs: default_retry_after_limit_secs(),
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl RetryConfig {
    /// Returns the retry-after ceiling as a Duration.
    pub fn retry_after_limit(&self) -> Duration {
        Duration::from_secs(self.retry_after_limit_secs)
    }

    /// Returns the fallback wait as a Duration.
    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum request weight per minute (0 disables limiting)
    #[serde(default = "default_request_weight_per_minute")]
    pub request_weight_per_minute: u32,
    /// Buffer factor for rate limits (e.g., 0.9 = use only 90% of limit)
    #[serde(default = "default_buffer_factor")]
    pub buffer_factor: f64,
}

fn default_request_weight_per_minute() -> u32 {
    1200
}

fn default_buffer_factor() -> f64 {
    0.9
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_weight_per_minute: default_request_weight_per_minute(),
            buffer_factor: default_buffer_factor(),
        }
    }
}

impl RateLimitConfig {
    /// A configuration that never delays requests.
    pub fn disabled() -> Self {
        Self {
            request_weight_per_minute: 0,
            ..Default::default()
        }
    }

    /// Returns the effective request weight per minute (with buffer).
    pub fn effective_request_weight_per_minute(&self) -> u32 {
        ((self.request_weight_per_minute as f64) * self.buffer_factor) as u32
    }
}

/// Authentication configuration.
///
/// API keys are loaded from environment variables, never from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Environment variable name for API secret
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "API_SECRET".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
        }
    }
}

impl AuthConfig {
    /// Create a new auth config with environment variable names.
    pub fn new(api_key_env: impl Into<String>, api_secret_env: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            api_secret_env: api_secret_env.into(),
        }
    }

    /// Load API key from environment.
    pub fn load_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    /// Load API secret from environment.
    pub fn load_api_secret(&self) -> Option<String> {
        std::env::var(&self.api_secret_env).ok()
    }

    /// Returns true if API credentials are available in environment.
    pub fn has_credentials(&self) -> bool {
        self.load_api_key().is_some() && self.load_api_secret().is_some()
    }
}
