//! HTTP client for venue REST APIs.
//!
//! This module provides a generic HTTP client that handles:
//! - Request signing via the `RequestSigner` trait
//! - Server clock offset for signed timestamps
//! - Client-side weight limiting via the `RateLimiter`
//! - Throttle handling (429/418 with `Retry-After`) via [`ThrottleState`]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::rate_limiter::RateLimiter;
use super::retry::{AttemptOutcome, FatalReason, ThrottleState};
use super::signer::{build_query_string, RequestSigner};
use crate::venue::config::{RestConfig, RetryConfig};
use crate::venue::error::{VenueError, VenueResult};

/// Name of the receive-window query parameter.
pub const RECV_WINDOW_PARAM: &str = "recvWindow";

/// HTTP client for venue REST APIs.
///
/// Each instance owns its signer and clock offset; share an instance only
/// between calls for the same account.
///
/// # Example
///
/// ```ignore
/// let signer = BinanceHmacSigner::new(credentials);
/// let client = HttpClient::new(
///     "https://api.binance.com",
///     Some(Box::new(signer)),
///     RateLimiter::from_config(&config.rate_limits),
///     config.rest.clone(),
///     config.retry.clone(),
/// )?;
///
/// let trades: Vec<serde_json::Value> = client
///     .get_signed("/api/v3/myTrades", &[("symbol", "BNBBTC")], 10)
///     .await?;
/// ```
pub struct HttpClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for all requests
    base_url: String,
    /// Request signer, absent for public-only clients
    signer: Option<Arc<dyn RequestSigner>>,
    /// Rate limiter
    rate_limiter: RateLimiter,
    /// REST configuration
    rest: RestConfig,
    /// Throttle configuration
    retry: RetryConfig,
    /// Server time minus local time, in milliseconds
    clock_offset_ms: AtomicI64,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for all requests (e.g., "https://api.binance.com")
    /// * `signer` - Request signer for authentication
    /// * `rate_limiter` - Rate limiter for the venue
    /// * `rest` - REST configuration
    /// * `retry` - Throttle handling configuration
    pub fn new(
        base_url: impl Into<String>,
        signer: Option<Box<dyn RequestSigner>>,
        rate_limiter: RateLimiter,
        rest: RestConfig,
        retry: RetryConfig,
    ) -> VenueResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(rest.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| VenueError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: signer.map(Arc::from),
            rate_limiter,
            rest,
            retry,
            clock_offset_ms: AtomicI64::new(0),
        })
    }

    /// Store a freshly measured server clock offset.
    pub fn set_clock_offset_ms(&self, offset_ms: i64) {
        self.clock_offset_ms.store(offset_ms, Ordering::Release);
    }

    /// Current server clock offset in milliseconds.
    pub fn clock_offset_ms(&self) -> i64 {
        self.clock_offset_ms.load(Ordering::Acquire)
    }

    /// Local time shifted onto the server clock, in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        let now = Utc::now().timestamp_millis() + self.clock_offset_ms();
        now.max(0) as u64
    }

    /// Build the full URL with query parameters.
    fn build_url(&self, endpoint: &str, params: &[(String, String)]) -> String {
        let base = format!("{}{}", self.base_url, endpoint);
        if params.is_empty() {
            base
        } else {
            format!("{}?{}", base, build_query_string(params))
        }
    }

    /// Sign a copy of the caller's parameters for one attempt.
    fn sign_params(
        &self,
        signer: &dyn RequestSigner,
        params: &[(String, String)],
    ) -> Vec<(String, String)> {
        let mut signed_params = params.to_vec();

        if !signed_params.iter().any(|(k, _)| k == RECV_WINDOW_PARAM) {
            signed_params.push((
                RECV_WINDOW_PARAM.to_string(),
                self.rest.recv_window_ms.to_string(),
            ));
        }

        signer.sign(&mut signed_params, self.timestamp_ms());
        signed_params
    }

    /// Make a public (unsigned) GET request.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - API endpoint (e.g., "/api/v3/time")
    /// * `params` - Query parameters
    /// * `weight` - Request weight for rate limiting
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        weight: u32,
    ) -> VenueResult<T> {
        let body = self.send_get(endpoint, &owned(params), weight, false).await?;
        parse_body(endpoint, &body)
    }

    /// Make a signed GET request.
    ///
    /// Every attempt, retries included, carries a fresh timestamp and
    /// signature computed from `params`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - API endpoint
    /// * `params` - Query parameters (recvWindow, timestamp and signature will be added)
    /// * `weight` - Request weight for rate limiting
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        weight: u32,
    ) -> VenueResult<T> {
        let body = self.send_get(endpoint, &owned(params), weight, true).await?;
        parse_body(endpoint, &body)
    }

    /// Issue a GET, riding out server throttling, and return the raw body.
    async fn send_get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        weight: u32,
        signed: bool,
    ) -> VenueResult<String> {
        let signer = if signed {
            Some(self.signer.as_deref().ok_or_else(|| {
                VenueError::Configuration(format!("{} requires API credentials", endpoint))
            })?)
        } else {
            None
        };

        let mut state = ThrottleState::new(&self.retry);

        loop {
            self.rate_limiter.check_weight_rate(weight).await;

            let mut request = match signer {
                Some(signer) => {
                    let signed_params = self.sign_params(signer, params);
                    self.client
                        .get(self.build_url(endpoint, &signed_params))
                        .header(signer.api_key_header(), signer.api_key())
                }
                None => self.client.get(self.build_url(endpoint, params)),
            };
            request = request.header(header::ACCEPT, "application/json");

            debug!(endpoint, attempt = state.attempts() + 1, signed, "GET");

            let response = request.send().await?;
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            match state.on_response(status, retry_after.as_deref()) {
                AttemptOutcome::Success => {
                    return response.text().await.map_err(|e| {
                        VenueError::Request(format!("Failed to read response: {}", e))
                    });
                }
                AttemptOutcome::Retry { wait } => {
                    warn!(
                        endpoint,
                        status,
                        attempt = state.attempts(),
                        wait_secs = wait.as_secs(),
                        "throttled by venue, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                AttemptOutcome::Fatal(reason) => {
                    let body = response.text().await.unwrap_or_default();
                    error!(endpoint, status, attempts = state.attempts(), ?reason, "request failed");
                    return Err(match reason {
                        FatalReason::RetryAfterTooLong { retry_after, limit } => {
                            VenueError::RetryAfterTooLong {
                                endpoint: endpoint.to_string(),
                                status,
                                message: describe_error_body(&body),
                                retry_after,
                                limit,
                            }
                        }
                        FatalReason::Status | FatalReason::AttemptsExhausted => {
                            VenueError::remote(endpoint, status, describe_error_body(&body))
                        }
                    });
                }
            }
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Returns true if this client can make signed requests.
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }
}

fn owned(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> VenueResult<T> {
    serde_json::from_str(body).map_err(|e| {
        VenueError::Parse(format!(
            "{} returned invalid JSON: {} - body: {}",
            endpoint, e, body
        ))
    })
}

/// Binance-style error response.
#[derive(Debug, serde::Deserialize)]
struct BinanceErrorResponse {
    code: i64,
    msg: String,
}

/// Render an error body, preferring the Binance `code`/`msg` payload.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<BinanceErrorResponse>(body) {
        Ok(err) => format!("Error code: {} and error message: {}", err.code, err.msg),
        Err(_) => body.to_string(),
    }
}
