//! Binance-specific configuration types.
//!
//! Supports both Binance.com and Binance.US. Both expose the same account
//! history endpoints under different hosts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::history::Location;
use crate::venue::config::VenueConfig;

/// Binance platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BinancePlatform {
    /// Binance.com (International)
    #[default]
    Com,
    /// Binance.US
    Us,
}

impl BinancePlatform {
    /// Parse platform from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "com" | "international" | "binance.com" => Some(Self::Com),
            "us" | "binance.us" => Some(Self::Us),
            _ => None,
        }
    }

    /// Get the display name for the platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Com => "Binance.com",
            Self::Us => "Binance.US",
        }
    }

    /// Production REST host.
    pub fn rest_url(&self) -> &'static str {
        match self {
            Self::Com => "https://api.binance.com",
            Self::Us => "https://api.binance.us",
        }
    }

    /// Location stamped on records fetched from this platform.
    pub fn location(&self) -> Location {
        match self {
            Self::Com => Location::Binance,
            Self::Us => Location::BinanceUs,
        }
    }
}

/// Configuration for the Binance history client.
///
/// Extends the base [`VenueConfig`] with Binance-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceVenueConfig {
    /// Base venue configuration
    #[serde(flatten)]
    pub base: VenueConfig,

    /// Binance platform (com or us)
    #[serde(default)]
    pub platform: BinancePlatform,

    /// Markets to query trades for; empty means every market the exchange lists
    #[serde(default)]
    pub markets: Vec<String>,

    /// Extra symbols to treat as unsupported, on top of the built-in set
    #[serde(default)]
    pub unsupported_assets: BTreeSet<String>,

    /// Longest span a single history request may cover, in days
    #[serde(default = "default_history_span_days")]
    pub history_span_days: u32,
}

fn default_history_span_days() -> u32 {
    90
}

impl Default for BinanceVenueConfig {
    fn default() -> Self {
        Self {
            base: VenueConfig::default(),
            platform: BinancePlatform::default(),
            markets: Vec::new(),
            unsupported_assets: BTreeSet::new(),
            history_span_days: default_history_span_days(),
        }
    }
}

impl BinanceVenueConfig {
    /// Configuration for Binance.com.
    pub fn com() -> Self {
        Self::default()
    }

    /// Configuration for Binance.US.
    pub fn us() -> Self {
        Self {
            platform: BinancePlatform::Us,
            ..Self::default()
        }
    }

    /// Restrict trade queries to the given markets.
    pub fn with_markets<I, S>(mut self, markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markets = markets.into_iter().map(Into::into).collect();
        self
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base.rest.base_url = base_url.into();
        self
    }

    /// REST base URL, falling back to the platform default.
    pub fn rest_url(&self) -> &str {
        if self.base.rest.base_url.is_empty() {
            self.platform.rest_url()
        } else {
            &self.base.rest.base_url
        }
    }

    /// Maximum history span in milliseconds.
    pub fn history_span_ms(&self) -> i64 {
        i64::from(self.history_span_days) * 86_400_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!(BinancePlatform::parse("COM"), Some(BinancePlatform::Com));
        assert_eq!(BinancePlatform::parse("binance.us"), Some(BinancePlatform::Us));
        assert_eq!(BinancePlatform::parse("kraken"), None);
        assert_eq!(BinancePlatform::Us.display_name(), "Binance.US");
    }

    #[test]
    fn test_rest_url_defaults_to_platform() {
        assert_eq!(BinanceVenueConfig::com().rest_url(), "https://api.binance.com");
        assert_eq!(BinanceVenueConfig::us().rest_url(), "https://api.binance.us");
        assert_eq!(
            BinanceVenueConfig::us()
                .with_base_url("http://127.0.0.1:9000")
                .rest_url(),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn test_history_span() {
        assert_eq!(BinanceVenueConfig::default().history_span_ms(), 7_776_000_000);
    }

    #[test]
    fn test_deserialize_flattened() {
        let toml_str = r#"
            platform = "us"
            markets = ["BNBBTC", "ETHBTC"]
            unsupported_assets = ["FOO"]

            [retry]
            max_attempts = 2

            [auth]
            api_key_env = "BINANCE_API_KEY"
            api_secret_env = "BINANCE_API_SECRET"
        "#;

        let config: BinanceVenueConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.platform, BinancePlatform::Us);
        assert_eq!(config.markets, vec!["BNBBTC", "ETHBTC"]);
        assert!(config.unsupported_assets.contains("FOO"));
        assert_eq!(config.history_span_days, 90);
        assert_eq!(config.base.retry.max_attempts, 2);
        assert_eq!(config.base.retry.retry_after_limit_secs, 60);
        assert_eq!(config.base.auth.api_key_env, "BINANCE_API_KEY");
        assert_eq!(config.platform.location(), Location::BinanceUs);
    }
}
