//! Settings for the sync CLI.
//!
//! Layered in order: `config/default`, `config/{RUN_MODE}`, `config/local`,
//! then `EXCHANGE_SYNC__*` environment variables (`__` separates levels,
//! e.g. `EXCHANGE_SYNC__BINANCE__PLATFORM=us`).

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use exchange_common::venue::binance::BinanceVenueConfig;
use serde::Deserialize;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "EXCHANGE_SYNC";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Binance account configuration
    #[serde(default)]
    pub binance: BinanceVenueConfig,
}

impl Settings {
    /// Load settings from configuration files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    /// Load settings with a custom environment variable prefix.
    pub fn load_with_prefix(env_prefix: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = Self::config_dir();

        Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load settings from a single file, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .build()?
            .try_deserialize()
    }

    fn config_dir() -> String {
        std::env::var("EXCHANGE_SYNC_CONFIG_DIR").unwrap_or_else(|_| "config".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_common::venue::binance::BinancePlatform;
    use std::io::Write;

    #[test]
    fn test_defaults_without_binance_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "# empty").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.binance.platform, BinancePlatform::Com);
        assert_eq!(settings.binance.history_span_days, 90);
        assert!(settings.binance.markets.is_empty());
    }

    #[test]
    fn test_binance_section_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[binance]
platform = "us"
markets = ["BTCUSD", "ETHUSD"]
unsupported_assets = ["XYZ"]
history_span_days = 30

[binance.retry]
max_attempts = 3
retry_after_limit_secs = 10

[binance.auth]
api_key_env = "BINANCEUS_API_KEY"
api_secret_env = "BINANCEUS_API_SECRET"
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        let binance = &settings.binance;
        assert_eq!(binance.platform, BinancePlatform::Us);
        assert_eq!(binance.markets, vec!["BTCUSD", "ETHUSD"]);
        assert!(binance.unsupported_assets.contains("XYZ"));
        assert_eq!(binance.history_span_days, 30);
        assert_eq!(binance.base.retry.max_attempts, 3);
        assert_eq!(binance.base.retry.retry_after_limit_secs, 10);
        assert_eq!(binance.base.auth.api_key_env, "BINANCEUS_API_KEY");
        assert_eq!(binance.rest_url(), "https://api.binance.us");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::from_file("/nonexistent/exchange-sync.toml").is_err());
    }
}
