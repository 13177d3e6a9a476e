//! Pure candle analysis
//!
//! Everything under this module is synchronous and stateless: a function of
//! the candle slice and the configuration passed in.

pub mod atr;
pub mod bias;
pub mod confidence;
pub mod levels;
pub mod liquidity;
pub mod sizing;
pub mod structure;
pub mod swing;
pub mod timeframe;
pub mod volume;
pub mod zones;

pub use atr::average_true_range;
pub use bias::{direction_from_bias, multi_timeframe_bias};
pub use confidence::{confluence_bonus, overall_confidence, timeframe_score};
pub use levels::{plan_levels, validate_levels, TradeLevels};
pub use liquidity::find_liquidity_levels;
pub use sizing::{calculate_position_size, PositionSize};
pub use structure::{analyze_market_structure, trend_strength};
pub use swing::{find_swings, is_swing_high, is_swing_low};
pub use timeframe::{analyze_timeframe, filter_relevant, timeframe_confidence};
pub use volume::{analyze_volume_profile, volume_by_price, volume_delta};
pub use zones::{find_fair_value_gaps, find_order_blocks};
