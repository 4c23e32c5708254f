use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use exchange_common::assets::{Asset, BinanceAssetResolver};
use exchange_common::history::AssetMovementCategory;
use exchange_common::messages::MessageAggregator;
use exchange_common::venue::binance::endpoints::{
    ACCOUNT, BINANCE_LAUNCH_TS, DEPOSIT_HISTORY, EXCHANGE_INFO, FIAT_ORDERS, FIAT_PAYMENTS,
    MY_TRADES, SERVER_TIME, WITHDRAW_HISTORY,
};
use exchange_common::venue::binance::{
    BinanceCredentials, BinanceHistoryClient, BinanceHmacSigner, BinanceVenueConfig,
};
use exchange_common::venue::{RateLimitConfig, RetryConfig, VenueError};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const API_KEY: &str = "test-key";
const API_SECRET: &str = "test-secret";
const DAY_MS: i64 = 86_400_000;
const LAUNCH_MS: i64 = BINANCE_LAUNCH_TS * 1000;

/// Helper: start a mock server and a client whose base URL points at it.
///
/// Client-side weight limiting is off and the `Retry-After` ceiling is one
/// second so throttle tests stay fast.
async fn setup(
    markets: &[&str],
) -> (MockServer, BinanceHistoryClient, Arc<MessageAggregator>) {
    let mock_server = MockServer::start().await;

    let mut config = BinanceVenueConfig::com()
        .with_base_url(mock_server.uri())
        .with_markets(markets.iter().copied());
    config.base.rate_limits = RateLimitConfig::disabled();
    config.base.retry = RetryConfig {
        max_attempts: 5,
        retry_after_limit_secs: 1,
        default_retry_after_secs: 0,
    };

    let messages = Arc::new(MessageAggregator::new());
    let client = BinanceHistoryClient::new(
        config,
        BinanceCredentials::new(API_KEY, API_SECRET),
        Arc::new(BinanceAssetResolver::default()),
        messages.clone(),
    )
    .unwrap();

    (mock_server, client, messages)
}

fn deposit(insert_time_ms: i64, coin: &str, amount: Value) -> Value {
    json!({
        "insertTime": insert_time_ms,
        "amount": amount,
        "coin": coin,
        "address": "0x6915f16f8791d0a1cc2bf47c13a6b2a92000504b",
        "txId": format!("0xdf33b22bdb2b28b1f75ccd201a4a4m6e7g83jy5fc5d5a9d13409615{insert_time_ms}"),
        "status": 1
    })
}

fn my_trade(id: i64, time_ms: i64) -> Value {
    json!({
        "symbol": "BNBBTC",
        "id": id,
        "orderId": id,
        "price": "4.00000100",
        "qty": "12.00000000",
        "commission": "10.10000000",
        "commissionAsset": "BNB",
        "time": time_ms,
        "isBuyer": true,
        "isMaker": false,
        "isBestMatch": true
    })
}

/// Mount an empty-array response for every listed history endpoint.
async fn mount_empty(mock_server: &MockServer, endpoints: &[&str]) {
    for endpoint in endpoints {
        Mock::given(method("GET"))
            .and(path(*endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(mock_server)
            .await;
    }
}

/// Check that a recorded request carries exactly one signature and that it
/// signs the rest of its own query string.
fn assert_freshly_signed(request: &wiremock::Request) {
    let query = request.url.query().unwrap();
    let (unsigned, signature) = query.split_once("&signature=").unwrap();
    assert!(!signature.contains('&'), "signature must be the last parameter");
    assert_eq!(query.matches("signature=").count(), 1);
    assert_eq!(query.matches("timestamp=").count(), 1);

    let signer = BinanceHmacSigner::new(BinanceCredentials::new(API_KEY, API_SECRET)).unwrap();
    assert_eq!(signer.compute_signature(unsigned), signature);
}

// ---------------------------------------------------------------------------
// Test 1: 429 -> 418 -> 418 with a hint above the ceiling fails on attempt 3
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_throttle_hint_above_ceiling_is_fatal() {
    let (mock_server, client, _) = setup(&[]).await;

    let banned = json!({"code": -1003, "msg": "Way too many requests; IP banned."});
    for (status, retry_after) in [(429u16, "0"), (418, "1"), (418, "2")] {
        Mock::given(method("GET"))
            .and(path(DEPOSIT_HISTORY))
            .and(header("X-MBX-APIKEY", API_KEY))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("Retry-After", retry_after)
                    .set_body_json(banned.clone()),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let err = client
        .api_query_list(DEPOSIT_HISTORY, &[("startTime", "1"), ("endTime", "2")])
        .await
        .unwrap_err();

    match &err {
        VenueError::RetryAfterTooLong {
            endpoint,
            status,
            message,
            retry_after,
            limit,
        } => {
            assert_eq!(endpoint, DEPOSIT_HISTORY);
            assert_eq!(*status, 418);
            assert_eq!(
                message,
                "Error code: -1003 and error message: Way too many requests; IP banned."
            );
            assert_eq!(*retry_after, Duration::from_secs(2));
            assert_eq!(*limit, Duration::from_secs(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err
        .to_string()
        .contains("failed with HTTP status code: 418. Error code: -1003"));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_freshly_signed(request);
    }
}

// ---------------------------------------------------------------------------
// Test 1b: throttled on every attempt within the ceiling exhausts the budget
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_throttle_exhausts_attempts() {
    let (mock_server, client, _) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(WITHDRAW_HISTORY))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"code": -1003, "msg": "Too many requests."})),
        )
        .expect(5)
        .mount(&mock_server)
        .await;

    let err = client
        .api_query_list(WITHDRAW_HISTORY, &[])
        .await
        .unwrap_err();

    match &err {
        VenueError::Remote {
            endpoint,
            status,
            message,
        } => {
            assert_eq!(endpoint, WITHDRAW_HISTORY);
            assert_eq!(*status, 429);
            assert!(message.contains("Too many requests."));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
    for request in &requests {
        assert_freshly_signed(request);
    }
}

// ---------------------------------------------------------------------------
// Test 2: throttling within the ceiling is ridden out
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_throttle_then_success() {
    let (mock_server, client, _) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([deposit(LAUNCH_MS, "ETH", json!("1"))])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let raw = client.api_query_list(DEPOSIT_HISTORY, &[]).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Test 3: non-throttle errors are fatal and carry the Binance error payload
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_remote_error_is_fatal_immediately() {
    let (mock_server, client, _) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(MY_TRADES))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client
        .api_query_list(MY_TRADES, &[("symbol", "NOPE")])
        .await
        .unwrap_err();

    assert!(matches!(err, VenueError::Remote { status: 400, .. }));
    assert_eq!(
        err.to_string(),
        "/api/v3/myTrades failed with HTTP status code: 400. \
         Error code: -1121 and error message: Invalid symbol."
    );
}

// ---------------------------------------------------------------------------
// Test 4: 90 days + 1 second becomes exactly two windowed requests
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_ninety_days_plus_one_second_is_two_requests() {
    let (mock_server, client, messages) = setup(&[]).await;
    let start_ts = BINANCE_LAUNCH_TS;
    let end_ts = start_ts + 90 * 86_400 + 1;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .and(query_param("startTime", LAUNCH_MS.to_string()))
        .and(query_param("endTime", (LAUNCH_MS + 90 * DAY_MS - 1).to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([deposit(LAUNCH_MS + DAY_MS, "ETH", json!(0.04670582))])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .and(query_param("startTime", (LAUNCH_MS + 90 * DAY_MS).to_string()))
        .and(query_param("endTime", (end_ts * 1000).to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([deposit(LAUNCH_MS + 90 * DAY_MS, "BTC", json!("0.5"))])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_empty(&mock_server, &[WITHDRAW_HISTORY, FIAT_ORDERS]).await;

    let movements = client
        .query_deposits_withdrawals(start_ts, end_ts)
        .await
        .unwrap();

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].asset, Asset::new("ETH"));
    assert_eq!(movements[0].amount, dec!(0.04670582));
    assert_eq!(movements[1].asset, Asset::new("BTC"));
    assert_eq!(movements[1].category, AssetMovementCategory::Deposit);
    assert!(messages.consume_errors().is_empty());

    // Two windows for each of deposits, withdrawals, fiat deposits, fiat withdrawals.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 8);
    for request in &requests {
        assert_freshly_signed(request);
    }
}

// ---------------------------------------------------------------------------
// Test 5: a fatal error in window 2 aborts the fetch and discards window 1
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_fatal_in_second_window_aborts() {
    let (mock_server, client, _) = setup(&[]).await;
    let start_ts = BINANCE_LAUNCH_TS;
    let end_ts = start_ts + 100 * 86_400;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .and(query_param("startTime", LAUNCH_MS.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([deposit(LAUNCH_MS + DAY_MS, "ETH", json!("1"))])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .and(query_param("startTime", (LAUNCH_MS + 90 * DAY_MS).to_string()))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(WITHDRAW_HISTORY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client
        .query_deposits_withdrawals(start_ts, end_ts)
        .await
        .unwrap_err();

    assert!(matches!(err, VenueError::Remote { status: 500, .. }));
    assert!(err
        .to_string()
        .starts_with("/sapi/v1/capital/deposit/hisrec failed with HTTP status code: 500"));
}

// ---------------------------------------------------------------------------
// Test 6: one good record and one with an invalid amount
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_invalid_amount_is_one_error() {
    let (mock_server, client, messages) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            deposit(LAUNCH_MS + DAY_MS, "ETH", json!(0.04670582)),
            deposit(LAUNCH_MS + 2 * DAY_MS, "ETH", Value::Null),
        ])))
        .mount(&mock_server)
        .await;
    mount_empty(&mock_server, &[WITHDRAW_HISTORY, FIAT_ORDERS]).await;

    let movements = client
        .query_deposits_withdrawals(BINANCE_LAUNCH_TS, BINANCE_LAUNCH_TS + 10 * 86_400)
        .await
        .unwrap();

    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, dec!(0.04670582));
    assert_eq!(messages.consume_errors().len(), 1);
    assert!(messages.consume_warnings().is_empty());
}

// ---------------------------------------------------------------------------
// Test 7: an unsupported asset is one warning and no error
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_unsupported_asset_is_one_warning() {
    let (mock_server, client, messages) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([deposit(LAUNCH_MS + DAY_MS, "BTCB", json!("1"))])),
        )
        .mount(&mock_server)
        .await;
    mount_empty(&mock_server, &[WITHDRAW_HISTORY, FIAT_ORDERS]).await;

    let movements = client
        .query_deposits_withdrawals(BINANCE_LAUNCH_TS, BINANCE_LAUNCH_TS + 10 * 86_400)
        .await
        .unwrap();

    assert!(movements.is_empty());
    assert_eq!(
        messages.consume_warnings(),
        vec!["Found binance deposit with unsupported asset BTCB. Ignoring it."]
    );
    assert!(messages.consume_errors().is_empty());
}

// ---------------------------------------------------------------------------
// Test 8: sync_time stores the server clock offset used for signing
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_sync_time_sets_offset() {
    let (mock_server, client, _) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(SERVER_TIME))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"serverTime": Utc::now().timestamp_millis() + 60_000})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let offset = client.sync_time().await.unwrap();
    assert!((55_000..=60_000).contains(&offset), "offset {offset}");
    assert_eq!(client.http_client().clock_offset_ms(), offset);

    let shifted = client.http_client().timestamp_ms() as i64;
    assert!(shifted - Utc::now().timestamp_millis() >= 50_000);

    let time_request = &mock_server.received_requests().await.unwrap()[0];
    assert!(time_request.url.query().is_none());
}

// ---------------------------------------------------------------------------
// Test 9: myTrades pages by fromId, selected markets only
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_trade_history_pages_by_from_id() {
    let (mock_server, client, messages) = setup(&["BNBBTC", "doesnotexist"]).await;
    let start_ts = BINANCE_LAUNCH_TS;
    let end_ts = start_ts + 10 * 86_400;
    let in_range_ms = LAUNCH_MS + DAY_MS;

    Mock::given(method("GET"))
        .and(path(EXCHANGE_INFO))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BNBBTC", "baseAsset": "BNB", "quoteAsset": "BTC"},
                {"symbol": "ETHBTC", "baseAsset": "ETH", "quoteAsset": "BTC"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let first_page: Vec<Value> = (1..=1000).map(|id| my_trade(id, in_range_ms)).collect();
    Mock::given(method("GET"))
        .and(path(MY_TRADES))
        .and(query_param("symbol", "BNBBTC"))
        .and(query_param("fromId", "0"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(first_page)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(MY_TRADES))
        .and(query_param("symbol", "BNBBTC"))
        .and(query_param("fromId", "1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            my_trade(1001, in_range_ms + 1000),
            my_trade(1002, (end_ts + 1) * 1000),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(MY_TRADES))
        .and(query_param("symbol", "doesnotexist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_empty(&mock_server, &[FIAT_PAYMENTS]).await;

    let trades = client.query_trade_history(start_ts, end_ts).await.unwrap();

    assert_eq!(trades.len(), 1001);
    assert_eq!(trades.last().unwrap().link, "1001");
    assert_eq!(trades[0].base_asset, Asset::new("BNB"));
    assert_eq!(trades[0].quote_asset, Asset::new("BTC"));
    assert!(messages.consume_errors().is_empty());
    assert!(messages.consume_warnings().is_empty());
}

// ---------------------------------------------------------------------------
// Test 10: balances sum free and locked and warn about unknown assets
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_balances_with_unknown_asset() {
    let (mock_server, client, messages) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT))
        .and(header("X-MBX-APIKEY", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "makerCommission": 15,
            "canTrade": true,
            "balances": [
                {"asset": "BTC", "free": "4723846.89208129", "locked": "2.50000000"},
                {"asset": "ETH", "free": "4763368.68006011", "locked": "0.00000000"},
                {"asset": "IDONTEXIST", "free": "1.00000000", "locked": "0.00000000"},
                {"asset": "LTC", "free": "0.00000000", "locked": "0.00000000"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let balances = client.query_balances().await.unwrap();

    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].asset, Asset::new("BTC"));
    assert_eq!(balances[0].amount, dec!(4723849.39208129));
    assert_eq!(balances[1].amount, dec!(4763368.68006011));

    let warnings = messages.consume_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("unknown binance asset IDONTEXIST"));
    assert_freshly_signed(&mock_server.received_requests().await.unwrap()[0]);
}

// ---------------------------------------------------------------------------
// Test 11: malformed top-level JSON is a parse error
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (mock_server, client, _) = setup(&[]).await;

    Mock::given(method("GET"))
        .and(path(DEPOSIT_HISTORY))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;

    let err = client.api_query_list(DEPOSIT_HISTORY, &[]).await.unwrap_err();
    assert!(matches!(err, VenueError::Parse(_)));
}
