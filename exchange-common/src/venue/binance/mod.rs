//! Binance account history.
//!
//! - [`BinanceHistoryClient`]: Balances, trades, deposits and withdrawals
//! - [`BinanceHmacSigner`]: HMAC-SHA256 request signing
//! - [`HistoryNormalizer`]: Raw JSON to venue-agnostic history records
//!
//! Binance.com and Binance.US share the implementation; only the host and
//! the record location differ.

mod client;
mod config;
pub mod endpoints;
mod normalizer;
mod signer;

pub use client::BinanceHistoryClient;
pub use config::{BinancePlatform, BinanceVenueConfig};
pub use normalizer::{
    markets_from_exchange_info, BinancePair, HistoryNormalizer, MarketMap, NormalizeError,
};
pub use signer::{BinanceCredentials, BinanceHmacSigner, API_KEY_HEADER};
