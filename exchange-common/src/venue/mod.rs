//! Venue REST infrastructure and the Binance history client.
//!
//! # Shared Infrastructure
//!
//! - [`http`]: Authenticated HTTP client with weight limiting and throttle handling
//! - [`window`]: Time-range splitting for endpoints with a maximum query span
//! - [`RecordReader`]: Typed access to raw JSON records
//!
//! # Venues
//!
//! - [`binance`]: Account history (balances, trades, deposits and withdrawals)
//!
//! # Example
//!
//! ```ignore
//! use exchange_common::venue::binance::{BinanceHistoryClient, BinanceVenueConfig};
//!
//! let client = BinanceHistoryClient::new(config, credentials, resolver, messages)?;
//! client.sync_time().await?;
//! let trades = client.query_trade_history(start_ts, end_ts).await?;
//! ```

mod config;
mod error;
mod record;

pub mod binance;
pub mod http;
pub mod window;

pub use config::{AuthConfig, RateLimitConfig, RestConfig, RetryConfig, VenueConfig};
pub use error::{VenueError, VenueResult};
pub use record::{RecordError, RecordReader};
pub use window::{fetch_windowed, TimeRange};
