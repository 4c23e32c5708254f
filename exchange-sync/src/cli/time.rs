//! Sync-time command - measure the local clock offset from the server

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::Session;
use crate::config::Settings;

/// Arguments for the sync-time command
#[derive(Args)]
pub struct SyncTimeArgs {}

/// Execute the sync-time command
pub async fn execute(_args: SyncTimeArgs, settings: &Settings, platform: Option<&str>) -> Result<()> {
    let session = Session::connect(settings, platform).await?;
    let offset_ms = session.client.http_client().clock_offset_ms();

    info!(
        location = %session.client.location(),
        offset_ms,
        "server clock synchronized"
    );
    println!("{}", offset_ms);
    Ok(())
}
