//! Trades command - trades on every selected market plus fiat payments

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::range::RangeArgs;
use super::{print_records, venue_failure, Session};
use crate::config::Settings;

/// Arguments for the trades command
#[derive(Args)]
pub struct TradesArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Only query these markets (comma-separated, e.g. BTCUSDT,ETHBTC)
    #[arg(long, value_delimiter = ',')]
    pub markets: Vec<String>,
}

/// Execute the trades command
pub async fn execute(args: TradesArgs, settings: &Settings, platform: Option<&str>) -> Result<()> {
    let (start, end) = args.range.resolve()?;

    let mut settings = settings.clone();
    if !args.markets.is_empty() {
        settings.binance.markets = args.markets;
    }

    let session = Session::connect(&settings, platform).await?;
    let trades = session
        .client
        .query_trade_history(start, end)
        .await
        .map_err(venue_failure)?;

    info!(count = trades.len(), start, end, "queried trade history");
    print_records(&trades)?;
    session.report_messages();
    Ok(())
}
