pub mod analysis;
pub mod config;
pub mod engine;
pub mod format;
pub mod handlers;
pub mod scanner;
pub mod sources;
pub mod types;

pub use config::{EngineConfig, ServiceConfig, Timeframe};
pub use engine::{evaluate, SignalEngine};
pub use format::format_signal_message;
pub use scanner::{ScanOutcome, Scanner};
pub use sources::{BinanceClient, BybitClient, FallbackCandleLoader, PacingPolicy};
pub use types::*;
