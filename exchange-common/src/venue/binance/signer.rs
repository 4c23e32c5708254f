//! HMAC-SHA256 request signing for the Binance API.
//!
//! The signature is the lowercase hex HMAC-SHA256 of the query string, keyed
//! by the API secret. Re-signing a parameter list first drops the previous
//! `timestamp` and `signature`, so a retried request never signs over a stale
//! signature.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::venue::config::AuthConfig;
use crate::venue::error::{VenueError, VenueResult};
use crate::venue::http::{
    build_query_string, strip_auth_params, RequestSigner, SIGNATURE_PARAM, TIMESTAMP_PARAM,
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on signed requests.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Binance API key and secret.
///
/// `Debug` never prints the secret and shows only a short prefix of the key.
#[derive(Clone, PartialEq, Eq)]
pub struct BinanceCredentials {
    api_key: String,
    api_secret: String,
}

impl BinanceCredentials {
    /// Create credentials from a key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Load credentials from the environment variables named in `auth`.
    pub fn from_auth(auth: &AuthConfig) -> VenueResult<Self> {
        let api_key = auth.load_api_key().ok_or_else(|| {
            VenueError::Configuration(format!("{} is not set", auth.api_key_env))
        })?;
        let api_secret = auth.load_api_secret().ok_or_else(|| {
            VenueError::Configuration(format!("{} is not set", auth.api_secret_env))
        })?;
        Ok(Self::new(api_key, api_secret))
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Key prefix safe to show in logs; short keys are hidden entirely.
fn masked_key(api_key: &str) -> String {
    if api_key.chars().count() <= 8 {
        return "****".to_string();
    }
    let prefix: String = api_key.chars().take(4).collect();
    format!("{}****", prefix)
}

impl fmt::Debug for BinanceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceCredentials")
            .field("api_key", &masked_key(&self.api_key))
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// HMAC-SHA256 request signer for the Binance API.
///
/// # Example
///
/// ```ignore
/// let signer = BinanceHmacSigner::new(BinanceCredentials::new("key", "secret"))?;
///
/// let mut params = vec![("symbol".to_string(), "BNBBTC".to_string())];
/// signer.sign(&mut params, 1499827319559);
///
/// // params now ends with timestamp and signature
/// ```
#[derive(Clone)]
pub struct BinanceHmacSigner {
    api_key: String,
    mac: HmacSha256,
}

impl BinanceHmacSigner {
    /// Create a signer keyed by the credential's secret.
    pub fn new(credentials: BinanceCredentials) -> VenueResult<Self> {
        let mac = HmacSha256::new_from_slice(credentials.api_secret.as_bytes())
            .map_err(|e| VenueError::Configuration(format!("invalid API secret: {}", e)))?;
        Ok(Self {
            api_key: credentials.api_key,
            mac,
        })
    }

    /// Compute the hex HMAC-SHA256 of `data`.
    pub fn compute_signature(&self, data: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for BinanceHmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceHmacSigner")
            .field("api_key", &masked_key(&self.api_key))
            .finish_non_exhaustive()
    }
}

impl RequestSigner for BinanceHmacSigner {
    fn sign(&self, params: &mut Vec<(String, String)>, timestamp: u64) {
        strip_auth_params(params);
        params.push((TIMESTAMP_PARAM.to_string(), timestamp.to_string()));

        let signature = self.compute_signature(&build_query_string(params));
        params.push((SIGNATURE_PARAM.to_string(), signature));
    }

    fn api_key_header(&self) -> &str {
        API_KEY_HEADER
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}
