//! Liquidity levels from short-lookback swings

use super::swing::{is_swing_high, is_swing_low};
use super::zones::keep_most_recent;
use crate::types::{Candle, LevelKind, LevelStrength, LiquidityLevel};

/// Swing highs become resistance, swing lows support. Keeps the `max_levels` most recent.
pub fn find_liquidity_levels(
    candles: &[Candle],
    lookback: usize,
    margin: usize,
    min_candles: usize,
    max_levels: usize,
) -> Vec<LiquidityLevel> {
    if candles.len() < min_candles {
        return Vec::new();
    }

    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let mut levels = Vec::new();

    for i in margin..candles.len().saturating_sub(margin) {
        if is_swing_high(&highs, i, lookback) {
            levels.push(LiquidityLevel {
                kind: LevelKind::Resistance,
                price: highs[i],
                timestamp: candles[i].timestamp,
                strength: LevelStrength::Strong,
            });
        }
        if is_swing_low(&lows, i, lookback) {
            levels.push(LiquidityLevel {
                kind: LevelKind::Support,
                price: lows[i],
                timestamp: candles[i].timestamp,
                strength: LevelStrength::Strong,
            });
        }
    }

    keep_most_recent(levels, max_levels)
}
