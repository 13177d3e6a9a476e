//! Candle providers and the priority-ordered fallback loader

pub mod binance;
pub mod bybit;
pub mod http;

pub use binance::{BinanceClient, BinanceMarket};
pub use bybit::BybitClient;
pub use http::{FetchHealth, JsonFetcher};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::types::{Candle, CandleSource, Result, SourceError, SourceHealth};

/// Delays applied around upstream requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPolicy {
    /// Wait after a rate-limited source before trying the next one
    pub rate_limit_backoff: Duration,
    /// Wait between symbols during a scan
    pub symbol_delay: Duration,
}

impl PacingPolicy {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            rate_limit_backoff: config.rate_limit_backoff(),
            symbol_delay: config.symbol_delay(),
        }
    }

    /// No waiting at all
    pub fn immediate() -> Self {
        Self {
            rate_limit_backoff: Duration::ZERO,
            symbol_delay: Duration::ZERO,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            rate_limit_backoff: Duration::from_secs(5),
            symbol_delay: Duration::from_millis(1500),
        }
    }
}

/// Tries each source in priority order until one returns candles
pub struct FallbackCandleLoader {
    sources: Vec<Arc<dyn CandleSource>>,
    pacing: PacingPolicy,
}

impl FallbackCandleLoader {
    pub fn new(pacing: PacingPolicy) -> Self {
        Self {
            sources: Vec::new(),
            pacing,
        }
    }

    /// Sources are tried in the order they were added
    pub fn add_source(&mut self, source: Arc<dyn CandleSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn CandleSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn pacing(&self) -> PacingPolicy {
        self.pacing
    }

    /// Production source chain: Binance futures, Binance spot, Bybit
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        Ok(Self::new(PacingPolicy::from_config(config))
            .with_source(Arc::new(BinanceClient::futures(&config.binance_futures_url, timeout)?))
            .with_source(Arc::new(BinanceClient::spot(&config.binance_spot_url, timeout)?))
            .with_source(Arc::new(BybitClient::new(&config.bybit_url, timeout)?)))
    }
}

#[async_trait]
impl CandleSource for FallbackCandleLoader {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        for (position, source) in self.sources.iter().enumerate() {
            info!("Trying {} for {} {}", source.name(), symbol, interval);

            let error = match source.fetch_candles(symbol, interval, limit).await {
                Ok(candles) if !candles.is_empty() => {
                    info!(
                        "{} returned {} candles for {} {}",
                        source.name(),
                        candles.len(),
                        symbol,
                        interval
                    );
                    return Ok(candles);
                }
                Ok(_) => SourceError::EmptyResponse {
                    source_name: source.name().to_string(),
                    symbol: symbol.to_string(),
                    interval: interval.to_string(),
                },
                Err(e) => e,
            };

            warn!("{} failed: {}", source.name(), error);

            let has_next = position + 1 < self.sources.len();
            if has_next && matches!(error, SourceError::RateLimit { .. }) {
                tokio::time::sleep(self.pacing.rate_limit_backoff).await;
            }
        }

        Err(SourceError::AllSourcesFailed {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
        })
    }

    fn health(&self) -> Vec<SourceHealth> {
        self.sources.iter().flat_map(|s| s.health()).collect()
    }

    fn name(&self) -> &str {
        "fallback"
    }
}
