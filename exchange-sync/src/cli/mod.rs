//! Command-line interface
//!
//! Provides commands for querying a Binance account's history.

pub mod balances;
pub mod movements;
pub mod range;
pub mod time;
pub mod trades;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use exchange_common::assets::BinanceAssetResolver;
use exchange_common::error::ErrorClassification;
use exchange_common::messages::MessageAggregator;
use exchange_common::venue::binance::{
    BinanceCredentials, BinanceHistoryClient, BinancePlatform, BinanceVenueConfig,
};
use exchange_common::venue::VenueError;

use crate::config::Settings;

/// Exchange Sync CLI
#[derive(Parser)]
#[command(name = "exchange-sync")]
#[command(about = "Pull account history from Binance and Binance.US")]
#[command(version)]
pub struct Cli {
    /// Platform override (com or us)
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize with the server clock and print the offset
    SyncTime(time::SyncTimeArgs),
    /// Query current balances
    Balances(balances::BalancesArgs),
    /// Query trades and fiat payments
    Trades(trades::TradesArgs),
    /// Query deposits, withdrawals and fiat orders
    Movements(movements::MovementsArgs),
}

/// Apply a `--platform` override to the configured venue.
pub fn apply_platform(mut config: BinanceVenueConfig, platform: Option<&str>) -> Result<BinanceVenueConfig> {
    if let Some(name) = platform {
        config.platform =
            BinancePlatform::parse(name).ok_or_else(|| anyhow!("unknown platform: {}", name))?;
    }
    Ok(config)
}

/// Client plus the sink its record-level messages go to.
pub struct Session {
    pub client: BinanceHistoryClient,
    pub messages: Arc<MessageAggregator>,
}

impl Session {
    /// Build a client from settings and synchronize its clock.
    pub async fn connect(settings: &Settings, platform: Option<&str>) -> Result<Self> {
        let config = apply_platform(settings.binance.clone(), platform)?;
        let credentials = BinanceCredentials::from_auth(&config.base.auth)?;
        let assets = Arc::new(BinanceAssetResolver::with_extra_unsupported(
            config.unsupported_assets.iter().cloned(),
        ));
        let messages = Arc::new(MessageAggregator::new());

        let client = BinanceHistoryClient::new(config, credentials, assets, messages.clone())?;
        client
            .sync_time()
            .await
            .map_err(venue_failure)
            .context("failed to synchronize with the server clock")?;

        Ok(Self { client, messages })
    }

    /// Log the warnings and errors collected so far.
    pub fn report_messages(&self) {
        let warnings = self.messages.consume_warnings();
        let errors = self.messages.consume_errors();
        if warnings.is_empty() && errors.is_empty() {
            return;
        }

        for message in &errors {
            warn!(kind = "error", "{}", message);
        }
        for message in &warnings {
            warn!(kind = "warning", "{}", message);
        }
        info!(
            warnings = warnings.len(),
            errors = errors.len(),
            "skipped records during {} query",
            self.client.location()
        );
    }
}

/// Log how a failed venue call should be treated and wrap it for `main`.
///
/// Transient failures (throttling, timeouts, 5xx) are worth a later rerun;
/// everything else needs a fix to settings or input first.
pub fn venue_failure(err: VenueError) -> anyhow::Error {
    let category = err.category();
    if err.is_transient() {
        warn!(
            ?category,
            retry_in_secs = err.suggested_retry_delay().map(|d| d.as_secs()),
            "venue call failed, a later run may succeed"
        );
    } else {
        error!(?category, "venue call failed");
    }
    anyhow::Error::new(err)
}

/// Print records as one JSON object per line.
pub fn print_records<T: Serialize>(records: &[T]) -> Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "exchange-sync",
            "--platform",
            "us",
            "trades",
            "--start",
            "2021-01-01",
            "--end",
            "2021-06-30",
        ])
        .unwrap();

        assert_eq!(cli.platform.as_deref(), Some("us"));
        match cli.command {
            Commands::Trades(args) => {
                assert_eq!(args.range.start.as_deref(), Some("2021-01-01"));
                assert_eq!(args.range.end.as_deref(), Some("2021-06-30"));
            }
            _ => panic!("expected trades command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["exchange-sync", "orders"]).is_err());
    }

    #[test]
    fn test_venue_failure_keeps_the_error() {
        let err = venue_failure(VenueError::remote("/api/v3/account", 503, "maintenance"));
        let venue = err.downcast_ref::<VenueError>().unwrap();
        assert!(venue.is_transient());
        assert_eq!(venue.status(), Some(503));

        let err = venue_failure(VenueError::Configuration("missing API_KEY".to_string()));
        assert!(!err.downcast_ref::<VenueError>().unwrap().is_transient());
        assert!(err.to_string().contains("missing API_KEY"));
    }

    #[test]
    fn test_apply_platform() {
        let config = apply_platform(BinanceVenueConfig::com(), Some("us")).unwrap();
        assert_eq!(config.platform, BinancePlatform::Us);

        let config = apply_platform(BinanceVenueConfig::us(), None).unwrap();
        assert_eq!(config.platform, BinancePlatform::Us);

        assert!(apply_platform(BinanceVenueConfig::com(), Some("kraken")).is_err());
    }
}
