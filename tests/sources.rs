//! Exchange clients against a local mock HTTP server

use serde_json::json;
use signal_engine::{
    BinanceClient, BybitClient, CandleSource, FallbackCandleLoader, PacingPolicy, SourceError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn binance_rows() -> serde_json::Value {
    let row = |open_time: i64, open: &str, high: &str, low: &str, close: &str, volume: &str| {
        json!([open_time, open, high, low, close, volume, open_time + 3_599_999, "0", 1, "0"])
    };
    json!([
        row(1700000000000, "100.0", "101.0", "99.0", "100.5", "10.0"),
        row(1700003600000, "100.5", "102.0", "100.0", "101.5", "12.0"),
        row(1700007200000, "101.5", "103.0", "101.0", "102.5", "14.0")
    ])
}

#[tokio::test]
async fn test_binance_futures_klines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "4h"))
        .and(query_param("limit", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binance_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let client = BinanceClient::futures(&server.uri(), TIMEOUT).unwrap();
    let candles = assert_ok!(client.fetch_candles("BTCUSDT", "4h", 300).await);

    assert_eq!(candles.len(), 3);
    assert_eq!(candles[0].timestamp, 1700000000000);
    assert_eq!(candles[2].close, 102.5);

    let health = client.health();
    assert_eq!(health[0].source, "binance-futures");
    assert!(health[0].is_healthy);
    assert_eq!(health[0].requests, 1);
}

#[tokio::test]
async fn test_binance_teapot_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let client = BinanceClient::spot(&server.uri(), TIMEOUT).unwrap();
    let err = assert_err!(client.fetch_candles("BTCUSDT", "1h", 10).await);

    match err {
        SourceError::RateLimit { source_name, .. } => assert_eq!(source_name, "binance-spot"),
        other => panic!("expected rate limit, got {other}"),
    }
    assert!(!client.health()[0].is_healthy);
}

#[tokio::test]
async fn test_binance_retry_after_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = BinanceClient::futures(&server.uri(), TIMEOUT).unwrap();
    let err = client.fetch_candles("BTCUSDT", "1h", 10).await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimit { retry_after: Some(7), .. }));
}

#[tokio::test]
async fn test_binance_server_error_and_bad_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -1121})))
        .mount(&server)
        .await;

    let futures = BinanceClient::futures(&server.uri(), TIMEOUT).unwrap();
    let err = futures.fetch_candles("BTCUSDT", "1h", 10).await.unwrap_err();
    assert!(matches!(err, SourceError::ApiError(ref msg) if msg.contains("500")));

    let spot = BinanceClient::spot(&server.uri(), TIMEOUT).unwrap();
    let err = spot.fetch_candles("BTCUSDT", "1h", 10).await.unwrap_err();
    assert!(matches!(err, SourceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_bybit_klines_are_reversed_and_interval_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("category", "linear"))
        .and(query_param("interval", "D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "linear",
                "symbol": "BTCUSDT",
                "list": [
                    ["1700172800000", "102", "104", "101", "103", "30", "0"],
                    ["1700086400000", "101", "103", "100", "102", "20", "0"],
                    ["1700000000000", "100", "102", "99", "101", "10", "0"]
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = BybitClient::new(&server.uri(), TIMEOUT).unwrap();
    let candles = assert_ok!(client.fetch_candles("BTCUSDT", "1d", 3).await);

    let stamps: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
    assert_eq!(stamps, vec![1700000000000, 1700086400000, 1700172800000]);
    assert_eq!(candles[0].close, 101.0);
}

#[tokio::test]
async fn test_bybit_ret_code_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 10001,
            "retMsg": "params error",
            "result": {}
        })))
        .mount(&server)
        .await;

    let client = BybitClient::new(&server.uri(), TIMEOUT).unwrap();
    let err = client.fetch_candles("NOPEUSDT", "1h", 3).await.unwrap_err();
    assert!(matches!(err, SourceError::ApiError(ref msg) if msg.contains("params error")));
}

#[tokio::test]
async fn test_fallback_moves_past_failing_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(418))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": { "list": [["1700000000000", "1", "2", "0.5", "1.5", "10", "0"]] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let loader = FallbackCandleLoader::new(PacingPolicy::immediate())
        .with_source(Arc::new(BinanceClient::futures(&server.uri(), TIMEOUT).unwrap()))
        .with_source(Arc::new(BinanceClient::spot(&server.uri(), TIMEOUT).unwrap()))
        .with_source(Arc::new(BybitClient::new(&server.uri(), TIMEOUT).unwrap()));

    let candles = loader.fetch_candles("BTCUSDT", "15m", 1).await.unwrap();
    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].close, 1.5);
    assert_eq!(loader.health().len(), 3);
}

#[tokio::test]
async fn test_fallback_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let loader = FallbackCandleLoader::new(PacingPolicy::immediate())
        .with_source(Arc::new(BinanceClient::futures(&server.uri(), TIMEOUT).unwrap()))
        .with_source(Arc::new(BybitClient::new(&server.uri(), TIMEOUT).unwrap()));

    let err = assert_err!(loader.fetch_candles("BTCUSDT", "1h", 10).await);
    assert!(matches!(err, SourceError::AllSourcesFailed { .. }));
}
