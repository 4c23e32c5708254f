//! Balances command

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{print_records, venue_failure, Session};
use crate::config::Settings;

/// Arguments for the balances command
#[derive(Args)]
pub struct BalancesArgs {}

/// Execute the balances command
pub async fn execute(_args: BalancesArgs, settings: &Settings, platform: Option<&str>) -> Result<()> {
    let session = Session::connect(settings, platform).await?;
    let balances = session.client.query_balances().await.map_err(venue_failure)?;

    info!(count = balances.len(), "queried balances");
    print_records(&balances)?;
    session.report_messages();
    Ok(())
}
