//! Movements command - deposits, withdrawals and fiat orders

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::range::RangeArgs;
use super::{print_records, venue_failure, Session};
use crate::config::Settings;

/// Arguments for the movements command
#[derive(Args)]
pub struct MovementsArgs {
    #[command(flatten)]
    pub range: RangeArgs,
}

/// Execute the movements command
pub async fn execute(args: MovementsArgs, settings: &Settings, platform: Option<&str>) -> Result<()> {
    let (start, end) = args.range.resolve()?;

    let session = Session::connect(settings, platform).await?;
    let movements = session
        .client
        .query_deposits_withdrawals(start, end)
        .await
        .map_err(venue_failure)?;

    info!(count = movements.len(), start, end, "queried deposits and withdrawals");
    print_records(&movements)?;
    session.report_messages();
    Ok(())
}
