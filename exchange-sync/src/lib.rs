//! Command-line history sync for Binance accounts.
//!
//! Loads [`config::Settings`], builds a history client from `exchange-common`
//! and prints the normalized records.

pub mod cli;
pub mod config;
