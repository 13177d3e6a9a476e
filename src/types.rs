use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Timeframe;

/// OHLCV candle, timestamp is the open time in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: i64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Local extremum confirmed by candles on both sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Position in the candle sequence
    pub index: usize,
    pub price: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Trend {
    pub fn is_neutral(&self) -> bool {
        *self == Trend::Neutral
    }

    /// +1 for bullish, -1 for bearish, 0 otherwise
    pub fn sign(&self) -> f64 {
        match self {
            Trend::Bullish => 1.0,
            Trend::Bearish => -1.0,
            Trend::Neutral => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStructure {
    pub swing_highs: Vec<SwingPoint>,
    pub swing_lows: Vec<SwingPoint>,
    pub trend: Trend,
    pub break_of_structure: bool,
    pub change_of_character: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Bullish,
    Bearish,
}

/// Price imbalance zone (order block or fair value gap)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub high: f64,
    pub low: f64,
    pub timestamp: i64,
    /// Deterministic strength in [0, 1]
    pub strength: f64,
}

impl Zone {
    /// Reference price used by the relevance filter
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

pub type OrderBlock = Zone;
pub type FairValueGap = Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrength {
    Strong,
}

/// Swing-derived support/resistance price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityLevel {
    #[serde(rename = "type")]
    pub kind: LevelKind,
    pub price: f64,
    pub timestamp: i64,
    pub strength: LevelStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub point_of_control: f64,
    pub total_volume: f64,
    pub average_volume: f64,
    /// Recent/older volume ratio, 1 when undefined
    pub volume_delta: f64,
}

impl Default for VolumeProfile {
    fn default() -> Self {
        Self {
            point_of_control: 0.0,
            total_volume: 0.0,
            average_volume: 0.0,
            volume_delta: 1.0,
        }
    }
}

/// Everything the engine knows about one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub price: f64,
    pub trend: Trend,
    pub trend_strength: f64,
    pub market_structure: MarketStructure,
    /// Filtered to the relevance distance
    pub order_blocks: Vec<OrderBlock>,
    /// Filtered to the relevance distance
    pub fair_value_gaps: Vec<FairValueGap>,
    pub volume_profile: VolumeProfile,
    /// Filtered to the relevance distance
    pub liquidity_levels: Vec<LiquidityLevel>,
    pub average_true_range: f64,
    /// Per-timeframe confidence, 0..=95
    pub confidence: f64,
}

impl TimeframeAnalysis {
    pub fn supports(&self) -> impl Iterator<Item = f64> + '_ {
        self.levels_of(LevelKind::Support)
    }

    pub fn resistances(&self) -> impl Iterator<Item = f64> + '_ {
        self.levels_of(LevelKind::Resistance)
    }

    pub fn levels_of(&self, kind: LevelKind) -> impl Iterator<Item = f64> + '_ {
        self.liquidity_levels
            .iter()
            .filter(move |l| l.kind == kind)
            .map(|l| l.price)
    }

    pub fn has_order_block(&self, kind: ZoneKind) -> bool {
        self.order_blocks.iter().any(|ob| ob.kind == kind)
    }
}

/// A timeframe that produced data, paired with its configuration entry
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedTimeframe {
    pub timeframe: Timeframe,
    pub analysis: TimeframeAnalysis,
}

/// Result of fetching and analyzing one timeframe
#[derive(Debug, Clone)]
pub enum TimeframeOutcome {
    Analyzed(AnalyzedTimeframe),
    Skipped { timeframe: Timeframe, reason: String },
}

impl TimeframeOutcome {
    pub fn analyzed(&self) -> Option<&AnalyzedTimeframe> {
        match self {
            TimeframeOutcome::Analyzed(tf) => Some(tf),
            TimeframeOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
    Neutral,
    NoTrade,
}

impl Direction {
    pub fn is_trade(&self) -> bool {
        matches!(self, Direction::Long | Direction::Short)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
            Direction::NoTrade => "NO_TRADE",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of the engine for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub direction: Direction,
    /// 0..=100
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loss: Option<f64>,
    /// Label of the timeframe the levels were planned on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    /// Present only for non-trade outcomes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl SignalResult {
    pub fn no_trade(symbol: &str, confidence: u8, reason: impl Into<String>) -> Self {
        Self::without_levels(symbol, Direction::NoTrade, confidence, reason.into())
    }

    pub fn neutral(symbol: &str, confidence: u8) -> Self {
        Self::without_levels(
            symbol,
            Direction::Neutral,
            confidence,
            "no clear bias across timeframes".to_string(),
        )
    }

    fn without_levels(symbol: &str, direction: Direction, confidence: u8, reason: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction,
            confidence,
            entry: None,
            stop_loss: None,
            take_profit: None,
            risk_reward: None,
            position_size: None,
            max_loss: None,
            timeframe: None,
            reason: Some(reason),
            generated_at: Utc::now(),
        }
    }

    pub fn is_trade(&self) -> bool {
        self.direction.is_trade()
    }
}

/// Source health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    pub is_healthy: bool,
    /// Requests issued since startup
    pub requests: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub success_rate: f64,
    pub last_latency_ms: u64,
}

/// Errors raised by candle providers
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded for {source_name}")]
    RateLimit {
        source_name: String,
        retry_after: Option<u64>,
    },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("{source_name} returned no candles for {symbol} {interval}")]
    EmptyResponse {
        source_name: String,
        symbol: String,
        interval: String,
    },

    #[error("All sources failed for {symbol} {interval}")]
    AllSourcesFailed { symbol: String, interval: String },
}

/// Reasons a symbol ends without a trade plan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("{timeframe} unavailable: {reason}")]
    DataUnavailable { timeframe: String, reason: String },

    #[error("no data available")]
    NoTimeframesAvailable,

    #[error("confidence {confidence}% below minimum {minimum}%")]
    LowConfidence { confidence: u8, minimum: u8 },

    #[error("no valid analysis available")]
    NoValidAnalysis,

    #[error("entry and stop-loss coincide at {0}")]
    DegenerateLevels(f64),

    #[error("analysis error: {0}")]
    Internal(String),
}

impl SignalError {
    /// Confidence reported alongside a NO_TRADE result
    pub fn confidence(&self) -> u8 {
        match self {
            SignalError::LowConfidence { confidence, .. } => *confidence,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Provider of chronologically ascending candle series
#[async_trait::async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `limit` candles, oldest first
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;

    /// Source health status
    fn health(&self) -> Vec<SourceHealth>;

    /// Source name
    fn name(&self) -> &str;
}
