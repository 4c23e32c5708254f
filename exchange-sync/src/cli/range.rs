//! Date range arguments shared by the history commands.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;

/// Date range for a history query
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start date (YYYY-MM-DD), defaults to the start of the exchange's history
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD, inclusive), defaults to now
    #[arg(long)]
    pub end: Option<String>,
}

impl RangeArgs {
    /// Resolve to unix seconds, `[start 00:00:00, end 23:59:59]` UTC.
    pub fn resolve(&self) -> Result<(i64, i64)> {
        let start = match &self.start {
            Some(date) => parse_date(date)?
                .and_hms_opt(0, 0, 0)
                .context("invalid start time")?
                .and_utc()
                .timestamp(),
            None => 0,
        };
        let end = match &self.end {
            Some(date) => parse_date(date)?
                .and_hms_opt(23, 59, 59)
                .context("invalid end time")?
                .and_utc()
                .timestamp(),
            None => Utc::now().timestamp(),
        };

        if start > end {
            bail!("start date is after end date");
        }
        Ok((start, end))
    }
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date {:?}, expected YYYY-MM-DD", date))
}
