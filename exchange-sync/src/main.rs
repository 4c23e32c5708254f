//! Exchange Sync CLI
//!
//! Provides commands for:
//! - `sync-time`: Measure the clock offset from the server
//! - `balances`: Query current balances
//! - `trades`: Query trades and fiat payments
//! - `movements`: Query deposits, withdrawals and fiat orders

use anyhow::{anyhow, Result};
use clap::Parser;

use exchange_common::logging::{init_logging, LogConfig};
use exchange_sync::cli::{self, Cli, Commands};
use exchange_sync::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging(LogConfig::from_env()).map_err(|e| anyhow!(e))?;

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let platform = cli.platform.as_deref();

    match cli.command {
        Commands::SyncTime(args) => cli::time::execute(args, &settings, platform).await?,
        Commands::Balances(args) => cli::balances::execute(args, &settings, platform).await?,
        Commands::Trades(args) => cli::trades::execute(args, &settings, platform).await?,
        Commands::Movements(args) => cli::movements::execute(args, &settings, platform).await?,
    }

    Ok(())
}
