//! Binance kline client (USD-M futures and spot)

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::http::JsonFetcher;
use crate::types::{Candle, CandleSource, Result, SourceError, SourceHealth};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceMarket {
    Futures,
    Spot,
}

impl BinanceMarket {
    fn klines_path(&self) -> &'static str {
        match self {
            BinanceMarket::Futures => "/fapi/v1/klines",
            BinanceMarket::Spot => "/api/v3/klines",
        }
    }

    fn source_name(&self) -> &'static str {
        match self {
            BinanceMarket::Futures => "binance-futures",
            BinanceMarket::Spot => "binance-spot",
        }
    }
}

pub struct BinanceClient {
    http: JsonFetcher,
    base_url: String,
    market: BinanceMarket,
}

impl BinanceClient {
    pub fn new(market: BinanceMarket, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: JsonFetcher::new(market.source_name(), timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            market,
        })
    }

    pub fn futures(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::new(BinanceMarket::Futures, base_url, timeout)
    }

    pub fn spot(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::new(BinanceMarket::Spot, base_url, timeout)
    }

    pub fn market(&self) -> BinanceMarket {
        self.market
    }

    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}{}", self.base_url, self.market.klines_path());
        let query = [
            ("symbol", symbol.to_uppercase()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];

        let raw: serde_json::Value = self.http.get_json(&url, &query).await?;
        let rows = raw.as_array().ok_or_else(|| {
            let source = self.market.source_name();
            SourceError::InvalidResponse(format!("{}: expected kline array", source))
        })?;

        let candles = parse_klines(rows);
        debug!("{} returned {} candles for {} {}", self.name(), candles.len(), symbol, interval);
        Ok(candles)
    }
}

/// Rows look like `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
/// Malformed rows are dropped.
pub fn parse_klines(rows: &[serde_json::Value]) -> Vec<Candle> {
    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            if row.len() < 6 {
                return None;
            }
            Some(Candle {
                timestamp: row[0].as_i64()?,
                open: number(&row[1])?,
                high: number(&row[2])?,
                low: number(&row[3])?,
                close: number(&row[4])?,
                volume: number(&row[5])?,
            })
        })
        .collect()
}

/// Binance sends prices as strings; accept plain numbers too
fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
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
        self.http.source_name()
    }
}
