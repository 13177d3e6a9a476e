//! Market structure: trend, break of structure, change of character

use super::swing::find_swings;
use crate::types::{Candle, MarketStructure, SwingPoint, Trend};

/// Classify structure from swing points found with `lookback` on each side.
/// Fewer than `min_candles` candles yields a neutral, empty structure.
pub fn analyze_market_structure(
    candles: &[Candle],
    lookback: usize,
    min_candles: usize,
) -> MarketStructure {
    if candles.len() < min_candles {
        return MarketStructure::default();
    }

    let (swing_highs, swing_lows) = find_swings(candles, lookback, lookback);
    let trend = classify_trend(&swing_highs, &swing_lows);

    let mut structure = MarketStructure {
        swing_highs,
        swing_lows,
        trend,
        break_of_structure: false,
        change_of_character: false,
    };
    structure.break_of_structure = detect_break_of_structure(&structure);
    structure.change_of_character = detect_change_of_character(&structure);
    structure
}

/// Compare the two most recent swing highs and lows
fn classify_trend(highs: &[SwingPoint], lows: &[SwingPoint]) -> Trend {
    let (Some([h0, h1]), Some([l0, l1])) = (last_n::<2>(highs), last_n::<2>(lows)) else {
        return Trend::Neutral;
    };

    if h1.price > h0.price && l1.price > l0.price {
        Trend::Bullish
    } else if h1.price < h0.price && l1.price < l0.price {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Three consecutive higher highs (bullish) or lower lows (bearish)
fn detect_break_of_structure(structure: &MarketStructure) -> bool {
    let (Some([h0, h1, h2]), Some([l0, l1, l2])) =
        (last_n::<3>(&structure.swing_highs), last_n::<3>(&structure.swing_lows))
    else {
        return false;
    };

    match structure.trend {
        Trend::Bullish => h2.price > h1.price && h1.price > h0.price,
        Trend::Bearish => l2.price < l1.price && l1.price < l0.price,
        Trend::Neutral => false,
    }
}

/// Bullish: the latest low recovered after a dip in the low sequence.
/// Bearish: the latest high rolled over after a spike in the high sequence.
fn detect_change_of_character(structure: &MarketStructure) -> bool {
    let (Some([h0, h1, h2]), Some([l0, l1, l2])) =
        (last_n::<3>(&structure.swing_highs), last_n::<3>(&structure.swing_lows))
    else {
        return false;
    };

    match structure.trend {
        Trend::Bullish => l2.price > l1.price && l1.price < l0.price,
        Trend::Bearish => h2.price < h1.price && h1.price > h0.price,
        Trend::Neutral => false,
    }
}

/// Average slope (price per candle) of the two latest swing highs and lows
pub fn trend_strength(structure: &MarketStructure) -> f64 {
    let (Some([h0, h1]), Some([l0, l1])) =
        (last_n::<2>(&structure.swing_highs), last_n::<2>(&structure.swing_lows))
    else {
        return 0.0;
    };

    let high_slope = slope(h0, h1);
    let low_slope = slope(l0, l1);
    (high_slope + low_slope).abs() / 2.0
}

fn slope(from: &SwingPoint, to: &SwingPoint) -> f64 {
    let run = to.index as f64 - from.index as f64;
    if run == 0.0 {
        return 0.0;
    }
    (to.price - from.price) / run
}

fn last_n<const N: usize>(points: &[SwingPoint]) -> Option<&[SwingPoint; N]> {
    points.len().checked_sub(N).and_then(|start| points[start..].try_into().ok())
}
