//! Bybit v5 linear kline client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::JsonFetcher;
use crate::types::{Candle, CandleSource, Result, SourceError, SourceHealth};

const SOURCE_NAME: &str = "bybit";
const DEFAULT_INTERVAL: &str = "60";

/// Exchange-neutral interval -> Bybit interval code
pub static BYBIT_INTERVALS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "1d" => "D",
    "4h" => "240",
    "1h" => "60",
    "15m" => "15",
};

/// Unknown intervals fall back to hourly
pub fn bybit_interval(interval: &str) -> &'static str {
    BYBIT_INTERVALS.get(interval).copied().unwrap_or(DEFAULT_INTERVAL)
}

#[derive(Debug, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<KlineResult>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}

pub struct BybitClient {
    http: JsonFetcher,
    base_url: String,
}

impl BybitClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: JsonFetcher::new(SOURCE_NAME, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Candles oldest first (Bybit sends newest first)
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/v5/market/kline", self.base_url);
        let query = [
            ("category", "linear".to_string()),
            ("symbol", symbol.to_uppercase()),
            ("interval", bybit_interval(interval).to_string()),
            ("limit", limit.to_string()),
        ];

        let response: BybitResponse = self.http.get_json(&url, &query).await?;
        if response.ret_code != 0 {
            return Err(SourceError::ApiError(format!(
                "Bybit API error {}: {}",
                response.ret_code, response.ret_msg
            )));
        }

        let list = response
            .result
            .map(|r| r.list)
            .ok_or_else(|| SourceError::InvalidResponse("bybit: missing result.list".to_string()))?;

        let candles = parse_kline_list(list);
        debug!("bybit returned {} candles for {} {}", candles.len(), symbol, interval);
        Ok(candles)
    }
}

/// Rows are `[startTime, open, high, low, close, volume, turnover]`, all strings
fn parse_kline_list(list: Vec<Vec<String>>) -> Vec<Candle> {
    let mut candles: Vec<Candle> = list
        .into_iter()
        .filter_map(|row| {
            if row.len() < 6 {
                return None;
            }
            Some(Candle {
                timestamp: row[0].parse().ok()?,
                open: row[1].parse().ok()?,
                high: row[2].parse().ok()?,
                low: row[3].parse().ok()?,
                close: row[4].parse().ok()?,
                volume: row[5].parse().ok()?,
            })
        })
        .collect();
    candles.reverse();
    candles
}

#[async_trait]
impl CandleSource for BybitClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.get_klines(symbol, interval, limit).await
    }

    fn health(&self) -> Vec<SourceHealth> {
        vec![self.http.health()]
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
