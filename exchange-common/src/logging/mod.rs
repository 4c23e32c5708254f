//! Logging setup shared by the library and the CLI.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Standard tracing filter (e.g., `info`, `exchange_common=debug`)
//! - `LOG_FORMAT`: Output format - `pretty` (default) or `compact`
//! - `LOG_TIMESTAMPS`: Timestamp format - `local` (default), `utc`, or `none`
//! - `LOG_LEVEL`: Fallback level when `RUST_LOG` is unset
//! - `LOG_LOCATION`: `true`/`false` for file:line info
//!
//! # Usage
//!
//! ```rust,ignore
//! use exchange_common::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::from_env())?;
//! ```

mod config;

pub use config::{init_logging, LogConfig, LogFormat, TimestampFormat};
