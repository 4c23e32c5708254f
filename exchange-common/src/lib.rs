//! Binance account history client.
//!
//! - [`venue`]: Signed HTTP client, throttle handling, time-range pagination
//!   and the Binance history client
//! - [`history`]: Venue-agnostic trade, movement and balance records
//! - [`assets`]: Venue symbol resolution
//! - [`messages`]: Sink for per-record warnings and errors
//! - [`error`]: Error classification shared by every error type
//! - [`logging`]: Tracing subscriber setup

pub mod assets;
pub mod error;
pub mod history;
pub mod logging;
pub mod messages;
pub mod venue;
