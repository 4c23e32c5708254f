use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;

/// Venue a record was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Binance.com
    Binance,
    /// Binance.US
    BinanceUs,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Binance => write!(f, "binance"),
            Location::BinanceUs => write!(f, "binanceus"),
        }
    }
}

/// Trade direction relative to the base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// Base asset acquired
    Buy,
    /// Base asset disposed of
    Sell,
}

impl TradeType {
    /// Buy for the buyer side of a fill, sell otherwise.
    pub fn from_is_buyer(is_buyer: bool) -> Self {
        if is_buyer {
            TradeType::Buy
        } else {
            TradeType::Sell
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

/// A trade of `amount` base asset at `rate` quote per base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Unix seconds
    pub timestamp: i64,
    pub location: Location,
    pub base_asset: Asset,
    pub quote_asset: Asset,
    pub trade_type: TradeType,
    /// Base asset quantity
    pub amount: Decimal,
    /// Quote per base
    pub rate: Decimal,
    pub fee: Decimal,
    pub fee_currency: Asset,
    /// Venue identifier of the trade
    pub link: String,
}

/// Direction of an asset movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetMovementCategory {
    Deposit,
    Withdrawal,
}

impl fmt::Display for AssetMovementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetMovementCategory::Deposit => write!(f, "deposit"),
            AssetMovementCategory::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// A deposit to or withdrawal from the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMovement {
    /// Unix seconds
    pub timestamp: i64,
    pub location: Location,
    pub category: AssetMovementCategory,
    pub asset: Asset,
    pub amount: Decimal,
    pub fee: Decimal,
    pub fee_asset: Asset,
    /// On-chain address, crypto movements only
    pub address: Option<String>,
    /// On-chain transaction hash, crypto movements only
    pub transaction_id: Option<String>,
    /// Venue identifier of the movement
    pub link: String,
}

/// Total (free plus locked) amount of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: Asset,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_type_from_is_buyer() {
        assert_eq!(TradeType::from_is_buyer(true), TradeType::Buy);
        assert_eq!(TradeType::from_is_buyer(false), TradeType::Sell);
        assert_eq!(TradeType::Sell.to_string(), "sell");
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::BinanceUs.to_string(), "binanceus");
        assert_eq!(AssetMovementCategory::Withdrawal.to_string(), "withdrawal");
    }

    #[test]
    fn test_trade_serializes_decimals_as_strings() {
        let trade = Trade {
            timestamp: 1_499_865_549,
            location: Location::Binance,
            base_asset: Asset::new("BNB"),
            quote_asset: Asset::new("BTC"),
            trade_type: TradeType::Buy,
            amount: dec!(12),
            rate: dec!(4.00000100),
            fee: dec!(10.1),
            fee_currency: Asset::new("BNB"),
            link: "28457".to_string(),
        };

        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["base_asset"], "BNB");
        assert_eq!(json["trade_type"], "buy");
        assert_eq!(json["rate"], "4.00000100");
    }
}
