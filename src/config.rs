//! Engine and service configuration
//!
//! `EngineConfig` holds the fixed weight/threshold tables the analysis runs
//! with. It is built once and handed to the engine, never mutated.
//! `ServiceConfig` covers the binary: port, watchlist, pacing and sources.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One analyzed timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    /// Display label ("D1", "H4", ...)
    pub label: String,
    /// Exchange kline interval ("1d", "4h", ...)
    pub interval: String,
    /// Weight in bias and confidence aggregation
    pub weight: f64,
}

impl Timeframe {
    pub fn new(label: &str, interval: &str, weight: f64) -> Self {
        Self {
            label: label.to_string(),
            interval: interval.to_string(),
            weight,
        }
    }

    /// Default table: D1, H4, H1, 15M
    pub fn defaults() -> Vec<Timeframe> {
        vec![
            Timeframe::new("D1", "1d", 1.5),
            Timeframe::new("H4", "4h", 1.3),
            Timeframe::new("H1", "1h", 1.1),
            Timeframe::new("15M", "15m", 0.8),
        ]
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeframes in evaluation order (highest first)
    pub timeframes: Vec<Timeframe>,
    /// Candles requested per timeframe
    pub candle_limit: usize,
    pub analysis: AnalysisConfig,
    /// Minimum overall confidence to emit a trade
    pub min_confidence: f64,
    /// Per-timeframe confidence that makes a timeframe primary
    pub primary_confidence: f64,
    /// |bias| must exceed this to pick a direction
    pub bias_threshold: f64,
    pub levels: LevelConfig,
    pub risk: RiskConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeframes: Timeframe::defaults(),
            candle_limit: 300,
            analysis: AnalysisConfig::default(),
            min_confidence: 60.0,
            primary_confidence: 70.0,
            bias_threshold: 0.5,
            levels: LevelConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

/// Detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub atr_period: usize,
    pub structure_lookback: usize,
    pub liquidity_lookback: usize,
    /// Interior margin scanned for liquidity swings
    pub liquidity_margin: usize,
    /// Below this many candles structure and liquidity are empty
    pub min_structure_candles: usize,
    /// Max distance from price as a fraction (0.05 = 5%)
    pub relevance_distance: f64,
    pub max_order_blocks: usize,
    pub max_fair_value_gaps: usize,
    pub max_liquidity_levels: usize,
    /// Next body must exceed current body by this factor
    pub order_block_body_ratio: f64,
    pub order_block_strength: f64,
    pub fair_value_gap_strength: f64,
    pub volume_buckets: usize,
    /// Decimal places of a volume-profile bucket key
    pub volume_bucket_decimals: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            structure_lookback: 3,
            liquidity_lookback: 2,
            liquidity_margin: 5,
            min_structure_candles: 10,
            relevance_distance: 0.05,
            max_order_blocks: 10,
            max_fair_value_gaps: 8,
            max_liquidity_levels: 6,
            order_block_body_ratio: 1.5,
            order_block_strength: 0.7,
            fair_value_gap_strength: 0.6,
            volume_buckets: 10,
            volume_bucket_decimals: 2,
        }
    }
}

/// Entry/stop/target multipliers, all ATR-relative unless noted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Order block counts as containing price below `high * (1 + tolerance)`
    pub order_block_tolerance: f64,
    /// Entry offset from an order block edge (fraction of price)
    pub order_block_entry_offset: f64,
    /// Entry offset from price inside a fair value gap
    pub fair_value_gap_entry_offset: f64,
    /// Entry offset from a liquidity level
    pub level_entry_offset: f64,
    /// Entry offset from price when nothing else applies
    pub market_entry_offset: f64,
    pub stop_search_atr: f64,
    pub stop_level_atr: f64,
    pub stop_default_atr: f64,
    pub target_search_atr: f64,
    pub target_default_atr: f64,
    /// Target clamp as multiples of risk
    pub min_target_risk: f64,
    pub max_target_risk: f64,
    /// Validation
    pub max_distance_atr: f64,
    pub reset_stop_atr: f64,
    pub reset_target_atr: f64,
    pub min_risk_reward: f64,
    pub max_risk_reward: f64,
    pub low_rr_reset: f64,
    pub high_rr_reset: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            order_block_tolerance: 0.02,
            order_block_entry_offset: 0.002,
            fair_value_gap_entry_offset: 0.005,
            level_entry_offset: 0.001,
            market_entry_offset: 0.002,
            stop_search_atr: 1.5,
            stop_level_atr: 0.6,
            stop_default_atr: 0.8,
            target_search_atr: 1.2,
            target_default_atr: 0.8,
            min_target_risk: 1.2,
            max_target_risk: 2.0,
            max_distance_atr: 2.5,
            reset_stop_atr: 1.0,
            reset_target_atr: 1.5,
            min_risk_reward: 0.8,
            max_risk_reward: 3.0,
            low_rr_reset: 1.0,
            high_rr_reset: 2.0,
        }
    }
}

/// Account risk used for position sizing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskConfig {
    pub account_balance: f64,
    /// Percent of balance risked per trade
    pub risk_percent: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            account_balance: 1000.0,
            risk_percent: 2.0,
        }
    }
}

/// Runtime settings of the service binary
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Delay before the first scan after startup
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
    /// Pause between symbols during a scan
    #[serde(default = "default_symbol_delay_ms")]
    pub symbol_delay_ms: u64,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Operating window start (local time)
    #[serde(default = "default_open_hour")]
    pub open_hour: u32,
    /// Operating window end (local time, hour:minute)
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,
    #[serde(default = "default_close_minute")]
    pub close_minute: u32,
    #[serde(default = "default_binance_futures_url")]
    pub binance_futures_url: String,
    #[serde(default = "default_binance_spot_url")]
    pub binance_spot_url: String,
    #[serde(default = "default_bybit_url")]
    pub bybit_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Wait after a rate-limited source before trying the next one
    #[serde(default = "default_rate_limit_backoff_secs")]
    pub rate_limit_backoff_secs: u64,
}

impl ServiceConfig {
    /// Load from `SIGNAL_ENGINE_*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SIGNAL_ENGINE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("watchlist"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn symbol_delay(&self) -> Duration {
        Duration::from_millis(self.symbol_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            watchlist: default_watchlist(),
            scan_interval_secs: default_scan_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            symbol_delay_ms: default_symbol_delay_ms(),
            utc_offset_hours: default_utc_offset_hours(),
            open_hour: default_open_hour(),
            close_hour: default_close_hour(),
            close_minute: default_close_minute(),
            binance_futures_url: default_binance_futures_url(),
            binance_spot_url: default_binance_spot_url(),
            bybit_url: default_bybit_url(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_backoff_secs: default_rate_limit_backoff_secs(),
        }
    }
}

fn default_port() -> u16 { 3000 }
fn default_scan_interval_secs() -> u64 { 2 * 60 * 60 }
fn default_startup_delay_secs() -> u64 { 10 }
fn default_symbol_delay_ms() -> u64 { 1500 }
fn default_utc_offset_hours() -> i32 { 7 }
fn default_open_hour() -> u32 { 4 }
fn default_close_hour() -> u32 { 23 }
fn default_close_minute() -> u32 { 30 }
fn default_binance_futures_url() -> String { "https://fapi.binance.com".to_string() }
fn default_binance_spot_url() -> String { "https://api.binance.com".to_string() }
fn default_bybit_url() -> String { "https://api.bybit.com".to_string() }
fn default_request_timeout_secs() -> u64 { 15 }
fn default_rate_limit_backoff_secs() -> u64 { 5 }

fn default_watchlist() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT",
        "ADAUSDT", "AVAXUSDT", "DOTUSDT", "TRXUSDT", "LINKUSDT",
        "MATICUSDT", "LTCUSDT", "ATOMUSDT", "ETCUSDT", "XLMUSDT",
        "BCHUSDT", "FILUSDT", "ALGOUSDT", "NEARUSDT", "UNIUSDT",
        "DOGEUSDT", "ZECUSDT", "1000PEPEUSDT", "ZENUSDT", "HYPEUSDT",
        "WIFUSDT", "MEMEUSDT", "BOMEUSDT", "POPCATUSDT", "MYROUSDT",
        "DOGUSDT", "TOSHIUSDT", "MOGUSDT", "TURBOUSDT", "NFPUSDT",
        "PEOPLEUSDT", "ARCUSDT", "BTCDOMUSDT", "TRUMPUSDT", "DASHUSDT",
        "APTUSDT", "ARBUSDT", "OPUSDT", "SUIUSDT", "SEIUSDT",
        "TIAUSDT", "INJUSDT", "RNDRUSDT", "FETUSDT", "AGIXUSDT",
        "OCEANUSDT", "JASMYUSDT", "GALAUSDT", "SANDUSDT", "MANAUSDT",
        "ENJUSDT", "CHZUSDT", "APEUSDT", "GMTUSDT", "LDOUSDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
