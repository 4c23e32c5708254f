use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Canonical asset identifier (e.g. `BTC`, `ETH`, `EUR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    /// Create an asset from its canonical identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// The canonical identifier.
    pub fn identifier(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a venue symbol did not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Symbol is not in the table
    #[error("unknown asset {0}")]
    Unknown(String),

    /// Symbol is known to exist but is deliberately not tracked
    #[error("unsupported asset {0}")]
    Unsupported(String),
}

impl AssetError {
    /// The venue symbol that failed to resolve.
    pub fn symbol(&self) -> &str {
        match self {
            AssetError::Unknown(s) | AssetError::Unsupported(s) => s,
        }
    }
}

impl ErrorClassification for AssetError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Permanent
    }
}

/// Maps venue symbols to canonical assets.
pub trait AssetResolver: Send + Sync {
    /// Resolve a venue symbol.
    fn resolve(&self, symbol: &str) -> Result<Asset, AssetError>;
}

/// Symbols Binance lists under a different name than the canonical one.
const BINANCE_RENAMES: &[(&str, &str)] = &[("BCHSV", "BSV"), ("YOYO", "YOYOW")];

const BINANCE_SYMBOLS: &[&str] = &[
    "1INCH", "AAVE", "ADA", "ALGO", "ATOM", "AVAX", "BAT", "BCH", "BNB", "BSV", "BTC", "BUSD",
    "CAKE", "COMP", "DAI", "DASH", "DOGE", "DOT", "EGLD", "ENJ", "EOS", "ETC", "ETH", "EUR",
    "FIL", "FTM", "GBP", "ICX", "IOTA", "LINK", "LTC", "LUNA", "MANA", "MATIC", "MKR", "NEAR",
    "NEO", "OMG", "QTUM", "RDN", "SAND", "SHIB", "SNX", "SOL", "SUSHI", "THETA", "TRX", "TRY",
    "UNI", "USD", "USDC", "USDT", "VET", "WAVES", "WBTC", "XLM", "XMR", "XRP", "XTZ", "YFI",
    "YOYOW", "ZEC", "ZIL", "ZRX",
];

const UNSUPPORTED_BINANCE_ASSETS: &[&str] = &[
    "BTCB", "ETF", "BULL", "BEAR", "ETHBULL", "ETHBEAR", "BNBBULL", "BNBBEAR", "EOSBULL",
    "EOSBEAR", "XRPBULL", "XRPBEAR", "BTCUP", "BTCDOWN", "ETHUP", "ETHDOWN", "BNBUP", "BNBDOWN",
    "ADAUP", "ADADOWN", "LINKUP", "LINKDOWN", "DOTUP", "DOTDOWN", "XRPUP", "XRPDOWN", "TRXUP",
    "TRXDOWN",
];

/// Default Binance symbol table.
pub fn default_binance_symbols() -> HashMap<String, Asset> {
    BINANCE_SYMBOLS
        .iter()
        .map(|s| (s.to_string(), Asset::new(*s)))
        .chain(
            BINANCE_RENAMES
                .iter()
                .map(|(venue, canonical)| (venue.to_string(), Asset::new(*canonical))),
        )
        .collect()
}

/// Binance tokens that are deliberately not tracked (wrapped and leveraged tokens).
pub fn default_unsupported_binance_assets() -> HashSet<String> {
    UNSUPPORTED_BINANCE_ASSETS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Table-backed resolver for Binance symbols.
///
/// Both the symbol table and the unsupported set are fixed at construction.
/// A symbol in the unsupported set is reported as unsupported even if the
/// table also knows it.
#[derive(Debug, Clone)]
pub struct BinanceAssetResolver {
    symbols: HashMap<String, Asset>,
    unsupported: HashSet<String>,
}

impl BinanceAssetResolver {
    /// Create a resolver from an explicit table and unsupported set.
    pub fn new(symbols: HashMap<String, Asset>, unsupported: HashSet<String>) -> Self {
        Self {
            symbols,
            unsupported,
        }
    }

    /// Default table, default unsupported set plus `extra_unsupported`.
    pub fn with_extra_unsupported<I, S>(extra_unsupported: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unsupported = default_unsupported_binance_assets();
        unsupported.extend(extra_unsupported.into_iter().map(Into::into));
        Self::new(default_binance_symbols(), unsupported)
    }

    /// Returns true if `symbol` is in the unsupported set.
    pub fn is_unsupported(&self, symbol: &str) -> bool {
        self.unsupported.contains(symbol)
    }
}

impl Default for BinanceAssetResolver {
    fn default() -> Self {
        Self::new(default_binance_symbols(), default_unsupported_binance_assets())
    }
}

impl AssetResolver for BinanceAssetResolver {
    fn resolve(&self, symbol: &str) -> Result<Asset, AssetError> {
        if self.unsupported.contains(symbol) {
            return Err(AssetError::Unsupported(symbol.to_string()));
        }
        self.symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| AssetError::Unknown(symbol.to_string()))
    }
}
