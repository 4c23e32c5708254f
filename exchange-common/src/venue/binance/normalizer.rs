//! History normalizer for Binance.
//!
//! Converts raw Binance JSON records to venue-agnostic history records. A
//! record that cannot be converted is skipped and reported to the message
//! sink: asset problems as warnings, data problems as errors. One bad record
//! never affects its neighbours.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::assets::{Asset, AssetError, AssetResolver};
use crate::history::{AssetMovement, AssetMovementCategory, Balance, Location, Trade, TradeType};
use crate::messages::MessageSink;
use crate::venue::record::{RecordError, RecordReader};

use super::endpoints::FiatTransactionType;

/// Binance market: venue symbol plus venue base and quote asset symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinancePair {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
}

/// Markets keyed by venue symbol (e.g. `BNBBTC`).
pub type MarketMap = HashMap<String, BinancePair>;

/// Build the market map from an `exchangeInfo` response.
pub fn markets_from_exchange_info(info: &Value) -> Result<MarketMap, RecordError> {
    let symbols = RecordReader::new(info)?
        .required_array("symbols")?;

    symbols
        .iter()
        .map(|entry| {
            let reader = RecordReader::new(entry)?;
            let pair = BinancePair {
                symbol: reader.required_str("symbol")?.to_string(),
                base_asset: reader.required_str("baseAsset")?.to_string(),
                quote_asset: reader.required_str("quoteAsset")?.to_string(),
            };
            Ok((pair.symbol.clone(), pair))
        })
        .collect()
}

/// Why a single record was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Time format of `applyTime` on capital withdrawals (UTC).
const APPLY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Status of a fiat payment that went through.
const FIAT_PAYMENT_COMPLETED: &str = "Completed";

/// Status of a fiat order that went through.
const FIAT_ORDER_SUCCESSFUL: &str = "Successful";

fn ms_to_secs(ms: i64) -> i64 {
    ms.div_euclid(1000)
}

/// Normalizer for Binance account history.
pub struct HistoryNormalizer {
    location: Location,
    assets: Arc<dyn AssetResolver>,
    messages: Arc<dyn MessageSink>,
}

impl HistoryNormalizer {
    /// Create a new normalizer.
    pub fn new(
        location: Location,
        assets: Arc<dyn AssetResolver>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            location,
            assets,
            messages,
        }
    }

    fn asset(&self, symbol: &str) -> Result<Asset, NormalizeError> {
        Ok(self.assets.resolve(symbol)?)
    }

    /// Convert every record of a batch, reporting and skipping the bad ones.
    ///
    /// `kind` names the record type in user-facing messages. `Ok(None)` from
    /// `convert` drops the record silently.
    pub fn collect<T, F>(&self, kind: &str, raw: &[Value], convert: F) -> Vec<T>
    where
        F: Fn(&Value) -> Result<Option<T>, NormalizeError>,
    {
        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            match convert(entry) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => self.report(kind, entry, e),
            }
        }
        records
    }

    fn report(&self, kind: &str, entry: &Value, error: NormalizeError) {
        match error {
            NormalizeError::Asset(AssetError::Unknown(symbol)) => self.messages.add_warning(
                format!("Found binance {} with unknown asset {}. Ignoring it.", kind, symbol),
            ),
            NormalizeError::Asset(AssetError::Unsupported(symbol)) => {
                self.messages.add_warning(format!(
                    "Found binance {} with unsupported asset {}. Ignoring it.",
                    kind, symbol
                ))
            }
            NormalizeError::Record(e) => {
                debug!(kind, record = %entry, error = %e, "skipping malformed record");
                self.messages.add_error(format!(
                    "Error processing a binance {}: {}. Ignoring it.",
                    kind, e
                ));
            }
        }
    }

    /// Convert one `myTrades` entry.
    pub fn trade(&self, raw: &Value, markets: &MarketMap) -> Result<Trade, NormalizeError> {
        let reader = RecordReader::new(raw)?;

        let symbol = reader.required_str("symbol")?;
        let link = reader.required_id("id")?;
        let rate = reader.required_decimal("price")?;
        let amount = reader.required_decimal("qty")?;
        let fee = reader.required_decimal("commission")?;
        let fee_symbol = reader.required_str("commissionAsset")?;
        let time = reader.required_i64("time")?;
        let is_buyer = reader.required_bool("isBuyer")?;

        let pair = markets.get(symbol).ok_or_else(|| {
            RecordError::invalid("symbol", format!("could not find {} in binance pairs", symbol))
        })?;

        Ok(Trade {
            timestamp: ms_to_secs(time),
            location: self.location,
            base_asset: self.asset(&pair.base_asset)?,
            quote_asset: self.asset(&pair.quote_asset)?,
            trade_type: TradeType::from_is_buyer(is_buyer),
            amount,
            rate,
            fee,
            fee_currency: self.asset(fee_symbol)?,
            link,
        })
    }

    /// Convert one `fiat/payments` entry; payments that did not complete
    /// yield `None`.
    pub fn fiat_payment(
        &self,
        raw: &Value,
        side: FiatTransactionType,
    ) -> Result<Option<Trade>, NormalizeError> {
        let reader = RecordReader::new(raw)?;

        let link = reader.required_id("orderNo")?;
        let source_amount = reader.required_decimal("sourceAmount")?;
        let fiat_symbol = reader.required_str("fiatCurrency")?;
        let obtain_amount = reader.required_decimal("obtainAmount")?;
        let crypto_symbol = reader.required_str("cryptoCurrency")?;
        let fee = reader.required_decimal("totalFee")?;
        let rate = reader.required_decimal("price")?;
        let status = reader.required_str("status")?;
        let create_time = reader.required_i64("createTime")?;

        if status != FIAT_PAYMENT_COMPLETED {
            return Ok(None);
        }

        let fiat = self.asset(fiat_symbol)?;
        let (trade_type, amount) = match side {
            FiatTransactionType::Inbound => (TradeType::Buy, obtain_amount),
            FiatTransactionType::Outbound => (TradeType::Sell, source_amount),
        };

        Ok(Some(Trade {
            timestamp: ms_to_secs(create_time),
            location: self.location,
            base_asset: self.asset(crypto_symbol)?,
            quote_asset: fiat.clone(),
            trade_type,
            amount,
            rate,
            fee,
            fee_currency: fiat,
            link,
        }))
    }

    /// Convert one `capital/deposit/hisrec` entry.
    pub fn deposit(&self, raw: &Value) -> Result<AssetMovement, NormalizeError> {
        let reader = RecordReader::new(raw)?;

        let insert_time = reader.required_i64("insertTime")?;
        let amount = reader.required_decimal("amount")?;
        let coin = reader.required_str("coin")?;
        let address = reader.optional_str("address")?.map(str::to_string);
        let transaction_id = reader.optional_str("txId")?.map(str::to_string);
        let id = reader.optional_id("id")?;

        let asset = self.asset(coin)?;
        Ok(AssetMovement {
            timestamp: ms_to_secs(insert_time),
            location: self.location,
            category: AssetMovementCategory::Deposit,
            fee_asset: asset.clone(),
            asset,
            amount,
            fee: Decimal::ZERO,
            address,
            link: id.or_else(|| transaction_id.clone()).unwrap_or_default(),
            transaction_id,
        })
    }

    /// Convert one `capital/withdraw/history` entry.
    pub fn withdrawal(&self, raw: &Value) -> Result<AssetMovement, NormalizeError> {
        let reader = RecordReader::new(raw)?;

        let apply_time = reader.required_str("applyTime")?;
        let amount = reader.required_decimal("amount")?;
        let coin = reader.required_str("coin")?;
        let fee = reader.required_decimal("transactionFee")?;
        let id = reader.optional_id("id")?;
        let address = reader.optional_str("address")?.map(str::to_string);
        let transaction_id = reader.optional_str("txId")?.map(str::to_string);

        let timestamp = NaiveDateTime::parse_from_str(apply_time, APPLY_TIME_FORMAT)
            .map_err(|e| RecordError::invalid("applyTime", format!("{:?}: {}", apply_time, e)))?
            .and_utc()
            .timestamp();

        let asset = self.asset(coin)?;
        Ok(AssetMovement {
            timestamp,
            location: self.location,
            category: AssetMovementCategory::Withdrawal,
            fee_asset: asset.clone(),
            asset,
            amount,
            fee,
            address,
            link: id.or_else(|| transaction_id.clone()).unwrap_or_default(),
            transaction_id,
        })
    }

    /// Convert one `fiat/orders` entry; orders that did not succeed yield
    /// `None`.
    pub fn fiat_order(
        &self,
        raw: &Value,
        side: FiatTransactionType,
    ) -> Result<Option<AssetMovement>, NormalizeError> {
        let reader = RecordReader::new(raw)?;

        let link = reader.required_id("orderNo")?;
        let fiat_symbol = reader.required_str("fiatCurrency")?;
        let amount = reader.required_decimal("amount")?;
        let fee = reader.required_decimal("totalFee")?;
        let status = reader.required_str("status")?;
        let create_time = reader.required_i64("createTime")?;

        if status != FIAT_ORDER_SUCCESSFUL {
            return Ok(None);
        }

        let asset = self.asset(fiat_symbol)?;
        let category = match side {
            FiatTransactionType::Inbound => AssetMovementCategory::Deposit,
            FiatTransactionType::Outbound => AssetMovementCategory::Withdrawal,
        };

        Ok(Some(AssetMovement {
            timestamp: ms_to_secs(create_time),
            location: self.location,
            category,
            fee_asset: asset.clone(),
            asset,
            amount,
            fee,
            address: None,
            transaction_id: None,
            link,
        }))
    }

    /// Convert the `balances` array of an `account` response.
    ///
    /// Free and locked amounts are summed; zero balances are dropped.
    pub fn balances(&self, account: &Value) -> Result<Vec<Balance>, RecordError> {
        let entries = RecordReader::new(account)?.required_array("balances")?;
        let mut balances = Vec::new();

        for entry in entries {
            match self.balance(entry) {
                Ok(Some(balance)) => balances.push(balance),
                Ok(None) => {}
                Err(NormalizeError::Asset(AssetError::Unknown(symbol))) => {
                    self.messages.add_warning(format!(
                        "Found unknown binance asset {}. Ignoring its balance query.",
                        symbol
                    ))
                }
                Err(NormalizeError::Asset(AssetError::Unsupported(symbol))) => {
                    self.messages.add_warning(format!(
                        "Found unsupported binance asset {}. Ignoring its balance query.",
                        symbol
                    ))
                }
                Err(NormalizeError::Record(e)) => self.messages.add_error(format!(
                    "Error processing a binance balance: {}. Ignoring it.",
                    e
                )),
            }
        }

        Ok(balances)
    }

    fn balance(&self, raw: &Value) -> Result<Option<Balance>, NormalizeError> {
        let reader = RecordReader::new(raw)?;
        let symbol = reader.required_str("asset")?;
        let amount = reader.required_decimal("free")? + reader.required_decimal("locked")?;

        if amount.is_zero() {
            return Ok(None);
        }

        Ok(Some(Balance {
            asset: self.asset(symbol)?,
            amount,
        }))
    }
}
