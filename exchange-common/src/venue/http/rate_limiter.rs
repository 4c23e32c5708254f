//! Client-side request weight limiting.
//!
//! Binance meters REST usage as "weight" per minute. Staying under the budget
//! locally keeps most calls from ever seeing a 429; the throttle handler in
//! [`super::retry`] covers the rest.
//!
//! Uses the `governor` crate for token bucket rate limiting.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use tracing::debug;

use crate::venue::config::RateLimitConfig;

type Limiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Request weight limiter.
pub struct RateLimiter {
    weight_limiter: Option<Arc<Limiter>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let weight_limiter = NonZeroU32::new(config.effective_request_weight_per_minute())
            .map(|rate| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(rate))));

        Self {
            weight_limiter,
            config: config.clone(),
        }
    }

    /// Wait until a request of the given weight fits the budget.
    ///
    /// Weights larger than the whole per-minute budget are clamped to it so
    /// the call cannot block forever.
    pub async fn check_weight_rate(&self, weight: u32) {
        if let Some(ref limiter) = self.weight_limiter {
            let budget = self.config.effective_request_weight_per_minute();
            let weight = weight.clamp(1, budget.max(1));
            debug!(weight, "checking weight rate limit");
            if let Some(n) = NonZeroU32::new(weight) {
                // Unreachable error: weight was clamped to the bucket size.
                let _ = limiter.until_n_ready(n).await;
            }
        }
    }

    /// Get the current rate limit configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check if rate limiting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.weight_limiter.is_some()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
