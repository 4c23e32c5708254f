//! Account history client for the Binance REST API.
//!
//! Every operation is a sequence of signed GETs issued one at a time through
//! the shared [`HttpClient`], so throttling, re-signing and weight limiting
//! apply to each of them. History endpoints that cap the queried span are
//! fetched window by window.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assets::AssetResolver;
use crate::history::{AssetMovement, Balance, Location, Trade};
use crate::messages::MessageSink;
use crate::venue::error::{VenueError, VenueResult};
use crate::venue::http::{HttpClient, RateLimiter};
use crate::venue::record::RecordReader;
use crate::venue::window::{fetch_windowed, TimeRange};

use super::config::BinanceVenueConfig;
use super::endpoints::{self, weight, FiatTransactionType, BINANCE_LAUNCH_TS, MY_TRADES_LIMIT};
use super::normalizer::{markets_from_exchange_info, HistoryNormalizer, MarketMap};
use super::signer::{BinanceCredentials, BinanceHmacSigner};

/// History client for one Binance account.
///
/// Owns its signer and server clock offset; create one client per account.
pub struct BinanceHistoryClient {
    /// HTTP client
    http_client: HttpClient,
    /// Venue configuration
    config: BinanceVenueConfig,
    /// Raw record conversion
    normalizer: HistoryNormalizer,
    /// Markets from `exchangeInfo`, loaded on first use
    markets: RwLock<Option<Arc<MarketMap>>>,
}

impl BinanceHistoryClient {
    /// Create a client for the configured platform.
    pub fn new(
        config: BinanceVenueConfig,
        credentials: BinanceCredentials,
        assets: Arc<dyn AssetResolver>,
        messages: Arc<dyn MessageSink>,
    ) -> VenueResult<Self> {
        if config.history_span_days == 0 {
            return Err(VenueError::Configuration(
                "history_span_days must be at least 1".to_string(),
            ));
        }

        let signer = BinanceHmacSigner::new(credentials)?;
        let http_client = HttpClient::new(
            config.rest_url(),
            Some(Box::new(signer)),
            RateLimiter::from_config(&config.base.rate_limits),
            config.base.rest.clone(),
            config.base.retry.clone(),
        )?;

        info!(
            platform = config.platform.display_name(),
            base_url = http_client.base_url(),
            "created binance history client"
        );

        Ok(Self {
            normalizer: HistoryNormalizer::new(config.platform.location(), assets, messages),
            http_client,
            config,
            markets: RwLock::new(None),
        })
    }

    /// Location stamped on every record this client returns.
    pub fn location(&self) -> Location {
        self.config.platform.location()
    }

    /// Get the venue configuration.
    pub fn config(&self) -> &BinanceVenueConfig {
        &self.config
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Measure the server clock offset and use it for all later signatures.
    ///
    /// Returns the offset in milliseconds (server minus local).
    pub async fn sync_time(&self) -> VenueResult<i64> {
        let body: Value = self
            .http_client
            .get_public(endpoints::SERVER_TIME, &[], weight(endpoints::SERVER_TIME))
            .await?;

        let server_time = RecordReader::new(&body)
            .and_then(|r| r.required_i64("serverTime"))
            .map_err(|e| VenueError::Parse(format!("{}: {}", endpoints::SERVER_TIME, e)))?;

        let offset_ms = server_time - Utc::now().timestamp_millis();
        self.http_client.set_clock_offset_ms(offset_ms);
        debug!(offset_ms, "synchronized with binance server time");
        Ok(offset_ms)
    }

    /// Fetch `exchangeInfo` and replace the cached market map.
    ///
    /// Returns the number of markets loaded.
    pub async fn load_markets(&self) -> VenueResult<usize> {
        let info: Value = self
            .http_client
            .get_public(endpoints::EXCHANGE_INFO, &[], weight(endpoints::EXCHANGE_INFO))
            .await?;

        let markets = markets_from_exchange_info(&info)
            .map_err(|e| VenueError::Parse(format!("{}: {}", endpoints::EXCHANGE_INFO, e)))?;
        let count = markets.len();
        *self.markets.write() = Some(Arc::new(markets));

        debug!(count, "loaded binance markets");
        Ok(count)
    }

    async fn markets(&self) -> VenueResult<Arc<MarketMap>> {
        if let Some(markets) = self.markets.read().clone() {
            return Ok(markets);
        }
        self.load_markets().await?;
        self.markets
            .read()
            .clone()
            .ok_or_else(|| VenueError::Parse("market map missing after load".to_string()))
    }

    /// Signed GET of an endpoint that returns a JSON array.
    pub async fn api_query_list(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> VenueResult<Vec<Value>> {
        self.http_client
            .get_signed(endpoint, params, weight(endpoint))
            .await
    }

    /// Spot balances (free plus locked) of every non-zero, resolvable asset.
    pub async fn query_balances(&self) -> VenueResult<Vec<Balance>> {
        let account: Value = self
            .http_client
            .get_signed(endpoints::ACCOUNT, &[], weight(endpoints::ACCOUNT))
            .await?;

        self.normalizer
            .balances(&account)
            .map_err(|e| VenueError::Parse(format!("{}: {}", endpoints::ACCOUNT, e)))
    }

    /// Spot trades and fiat buys/sells between `start_ts` and `end_ts`
    /// (unix seconds, inclusive), ordered by timestamp.
    pub async fn query_trade_history(&self, start_ts: i64, end_ts: i64) -> VenueResult<Vec<Trade>> {
        let range = TimeRange::new(start_ts, end_ts)?;
        let markets = self.markets().await?;

        let symbols: Vec<&str> = if self.config.markets.is_empty() {
            let mut all: Vec<&str> = markets.keys().map(String::as_str).collect();
            all.sort_unstable();
            all
        } else {
            self.config
                .markets
                .iter()
                .map(String::as_str)
                .filter(|symbol| {
                    let listed = markets.contains_key(*symbol);
                    if !listed {
                        debug!(symbol, "skipping market not listed by binance");
                    }
                    listed
                })
                .collect()
        };

        let mut trades = Vec::new();
        for symbol in symbols {
            let raw = self.query_my_trades(symbol).await?;
            trades.extend(self.normalizer.collect("trade", &raw, |entry| {
                self.normalizer
                    .trade(entry, &markets)
                    .map(|trade| range.contains(trade.timestamp).then_some(trade))
            }));
        }

        for side in [FiatTransactionType::Inbound, FiatTransactionType::Outbound] {
            let raw = self
                .query_windowed(
                    endpoints::FIAT_PAYMENTS,
                    range,
                    &[("transactionType", side.as_param())],
                )
                .await?;
            trades.extend(
                self.normalizer
                    .collect("fiat payment", &raw, |entry| self.normalizer.fiat_payment(entry, side)),
            );
        }

        trades.sort_by_key(|trade| trade.timestamp);
        Ok(trades)
    }

    /// Every `myTrades` page of one symbol, following `fromId`.
    async fn query_my_trades(&self, symbol: &str) -> VenueResult<Vec<Value>> {
        let limit = MY_TRADES_LIMIT.to_string();
        let mut from_id: i64 = 0;
        let mut all = Vec::new();

        loop {
            let from_id_str = from_id.to_string();
            let page = self
                .api_query_list(
                    endpoints::MY_TRADES,
                    &[
                        ("symbol", symbol),
                        ("fromId", from_id_str.as_str()),
                        ("limit", limit.as_str()),
                    ],
                )
                .await?;

            let page_len = page.len();
            let last_id = page
                .last()
                .map(|entry| RecordReader::new(entry).and_then(|r| r.required_i64("id")));
            all.extend(page);

            if page_len < MY_TRADES_LIMIT {
                break;
            }
            match last_id {
                Some(Ok(id)) if id < i64::MAX => from_id = id + 1,
                _ => {
                    warn!(symbol, "full myTrades page without a usable last id, stopping");
                    break;
                }
            }
        }

        debug!(symbol, count = all.len(), "fetched binance trades");
        Ok(all)
    }

    /// Crypto and fiat deposits and withdrawals between `start_ts` and
    /// `end_ts` (unix seconds, inclusive), ordered by timestamp.
    pub async fn query_deposits_withdrawals(
        &self,
        start_ts: i64,
        end_ts: i64,
    ) -> VenueResult<Vec<AssetMovement>> {
        let range = TimeRange::new(start_ts, end_ts)?;
        let mut movements = Vec::new();

        let raw = self
            .query_windowed(endpoints::DEPOSIT_HISTORY, range, &[])
            .await?;
        movements.extend(
            self.normalizer
                .collect("deposit", &raw, |entry| self.normalizer.deposit(entry).map(Some)),
        );

        let raw = self
            .query_windowed(endpoints::WITHDRAW_HISTORY, range, &[])
            .await?;
        movements.extend(
            self.normalizer
                .collect("withdrawal", &raw, |entry| self.normalizer.withdrawal(entry).map(Some)),
        );

        for side in [FiatTransactionType::Inbound, FiatTransactionType::Outbound] {
            let raw = self
                .query_windowed(
                    endpoints::FIAT_ORDERS,
                    range,
                    &[("transactionType", side.as_param())],
                )
                .await?;
            movements.extend(
                self.normalizer
                    .collect("fiat order", &raw, |entry| self.normalizer.fiat_order(entry, side)),
            );
        }

        movements.sort_by_key(|movement| movement.timestamp);
        Ok(movements)
    }

    /// Windowed fetch of a history endpoint taking `startTime`/`endTime` in
    /// milliseconds. The start is clamped to the Binance launch.
    async fn query_windowed(
        &self,
        endpoint: &str,
        range: TimeRange,
        extra: &[(&str, &str)],
    ) -> VenueResult<Vec<Value>> {
        let start_ts = range.start().max(BINANCE_LAUNCH_TS);
        if start_ts > range.end() {
            return Ok(Vec::new());
        }
        let range_ms = TimeRange::new(to_millis(start_ts)?, to_millis(range.end())?)?;

        fetch_windowed(range_ms, self.config.history_span_ms(), |window| {
            let mut params: Vec<(String, String)> = extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            params.push(("startTime".to_string(), window.start().to_string()));
            params.push(("endTime".to_string(), window.end().to_string()));

            async move {
                let params: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                self.api_query_list(endpoint, &params).await
            }
        })
        .await
    }
}

/// Unix seconds to milliseconds, rejecting timestamps that overflow.
fn to_millis(ts: i64) -> VenueResult<i64> {
    ts.checked_mul(1000).ok_or_else(|| {
        VenueError::InvalidRequest(format!("timestamp {} is out of range", ts))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BinanceAssetResolver;
    use crate::messages::MessageAggregator;

    fn client(config: BinanceVenueConfig) -> VenueResult<BinanceHistoryClient> {
        BinanceHistoryClient::new(
            config,
            BinanceCredentials::new("key", "secret"),
            Arc::new(BinanceAssetResolver::default()),
            Arc::new(MessageAggregator::new()),
        )
    }

    #[test]
    fn test_new_uses_platform_host() {
        let client = client(BinanceVenueConfig::us()).unwrap();
        assert_eq!(client.http_client().base_url(), "https://api.binance.us");
        assert_eq!(client.location(), Location::BinanceUs);
        assert!(client.http_client().has_signer());
    }

    #[test]
    fn test_zero_span_is_rejected() {
        let mut config = BinanceVenueConfig::com();
        config.history_span_days = 0;
        assert!(matches!(client(config), Err(VenueError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_reversed_range_is_rejected() {
        let client = client(BinanceVenueConfig::com()).unwrap();
        assert!(matches!(
            client.query_deposits_withdrawals(10, 5).await,
            Err(VenueError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_range_overflowing_milliseconds_is_rejected() {
        let client = client(BinanceVenueConfig::com().with_base_url("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            client
                .query_deposits_withdrawals(BINANCE_LAUNCH_TS, i64::MAX / 100)
                .await,
            Err(VenueError::InvalidRequest(_))
        ));
        assert!(matches!(to_millis(i64::MIN), Err(VenueError::InvalidRequest(_))));
        assert_eq!(to_millis(BINANCE_LAUNCH_TS).unwrap(), 1_500_001_200_000);
    }

    #[tokio::test]
    async fn test_range_before_launch_fetches_nothing() {
        let client = client(BinanceVenueConfig::com().with_base_url("http://127.0.0.1:9")).unwrap();
        let range = TimeRange::new(0, BINANCE_LAUNCH_TS - 1).unwrap();
        let raw = client
            .query_windowed(endpoints::DEPOSIT_HISTORY, range, &[])
            .await
            .unwrap();
        assert!(raw.is_empty());
    }
}
