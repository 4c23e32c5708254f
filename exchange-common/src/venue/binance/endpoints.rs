//! Binance REST paths and request weights used by the history client.

/// Server time (public).
pub const SERVER_TIME: &str = "/api/v3/time";
/// Exchange info: symbols with base and quote assets (public).
pub const EXCHANGE_INFO: &str = "/api/v3/exchangeInfo";
/// Spot account balances.
pub const ACCOUNT: &str = "/api/v3/account";
/// Spot trade fills for one symbol.
pub const MY_TRADES: &str = "/api/v3/myTrades";
/// Crypto deposit history.
pub const DEPOSIT_HISTORY: &str = "/sapi/v1/capital/deposit/hisrec";
/// Crypto withdrawal history.
pub const WITHDRAW_HISTORY: &str = "/sapi/v1/capital/withdraw/history";
/// Fiat buy/sell history.
pub const FIAT_PAYMENTS: &str = "/sapi/v1/fiat/payments";
/// Fiat deposit/withdrawal history.
pub const FIAT_ORDERS: &str = "/sapi/v1/fiat/orders";

/// Page size for `myTrades`.
pub const MY_TRADES_LIMIT: usize = 1000;

/// Binance spot launch, 2017-07-14, in seconds. History starts here.
pub const BINANCE_LAUNCH_TS: i64 = 1_500_001_200;

/// Request weight of an endpoint, for client-side limiting.
pub fn weight(endpoint: &str) -> u32 {
    match endpoint {
        SERVER_TIME => 1,
        EXCHANGE_INFO | ACCOUNT | MY_TRADES => 20,
        _ => 1,
    }
}

/// `transactionType` values shared by the fiat endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiatTransactionType {
    /// Buy (payments) or deposit (orders)
    Inbound,
    /// Sell (payments) or withdrawal (orders)
    Outbound,
}

impl FiatTransactionType {
    /// Query value.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Inbound => "0",
            Self::Outbound => "1",
        }
    }
}
