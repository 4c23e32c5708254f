//! Venue-independent account history records.
//!
//! - [`Trade`]: A filled spot trade or a fiat buy/sell
//! - [`AssetMovement`]: A deposit or withdrawal, crypto or fiat
//! - [`Balance`]: Amount of one asset held on a venue
//!
//! Timestamps are unix seconds; amounts are [`rust_decimal::Decimal`].

mod types;

pub use types::{AssetMovement, AssetMovementCategory, Balance, Location, Trade, TradeType};
