//! Per-timeframe analysis: runs every detector over one candle series

use super::atr::average_true_range;
use super::liquidity::find_liquidity_levels;
use super::structure::{analyze_market_structure, trend_strength};
use super::volume::analyze_volume_profile;
use super::zones::{find_fair_value_gaps, find_order_blocks};
use crate::config::AnalysisConfig;
use crate::types::{Candle, LiquidityLevel, MarketStructure, TimeframeAnalysis, VolumeProfile, Zone};

const BASE_CONFIDENCE: f64 = 50.0;
const TREND_CONFIDENCE: f64 = 20.0;
const VOLUME_CONFIDENCE: f64 = 15.0;
const ORDER_BLOCK_CONFIDENCE: f64 = 10.0;
const MAX_TIMEFRAME_CONFIDENCE: f64 = 95.0;
const VOLUME_SURGE: f64 = 1.2;

/// Analyze one timeframe. `None` for an empty series.
pub fn analyze_timeframe(candles: &[Candle], config: &AnalysisConfig) -> Option<TimeframeAnalysis> {
    let price = candles.last()?.close;

    let market_structure = analyze_market_structure(
        candles,
        config.structure_lookback,
        config.min_structure_candles,
    );
    let order_blocks = find_order_blocks(
        candles,
        config.order_block_body_ratio,
        config.order_block_strength,
        config.max_order_blocks,
    );
    let fair_value_gaps = find_fair_value_gaps(
        candles,
        config.fair_value_gap_strength,
        config.max_fair_value_gaps,
    );
    let volume_profile = analyze_volume_profile(
        candles,
        config.volume_buckets,
        config.volume_bucket_decimals,
    );
    let liquidity_levels = find_liquidity_levels(
        candles,
        config.liquidity_lookback,
        config.liquidity_margin,
        config.min_structure_candles,
        config.max_liquidity_levels,
    );
    let average_true_range = average_true_range(candles, config.atr_period);

    // Confidence counts every detected block, before the relevance filter
    let confidence = timeframe_confidence(&market_structure, &volume_profile, order_blocks.len());
    let distance = config.relevance_distance;

    Some(TimeframeAnalysis {
        price,
        trend: market_structure.trend,
        trend_strength: trend_strength(&market_structure),
        order_blocks: filter_relevant(order_blocks, price, distance, Zone::mid),
        fair_value_gaps: filter_relevant(fair_value_gaps, price, distance, Zone::mid),
        liquidity_levels: filter_relevant(liquidity_levels, price, distance, |l: &LiquidityLevel| {
            l.price
        }),
        market_structure,
        volume_profile,
        average_true_range,
        confidence,
    })
}

/// Drop items whose reference price is `max_distance` (fraction of price) or farther away
pub fn filter_relevant<T>(
    items: Vec<T>,
    price: f64,
    max_distance: f64,
    reference: impl Fn(&T) -> f64,
) -> Vec<T> {
    if price == 0.0 {
        return Vec::new();
    }
    items
        .into_iter()
        .filter(|item| ((reference(item) - price) / price).abs() < max_distance)
        .collect()
}

/// 50 base, +20 trending, +15 volume surge, +10 with order blocks, capped at 95
pub fn timeframe_confidence(
    structure: &MarketStructure,
    volume: &VolumeProfile,
    order_block_count: usize,
) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if !structure.trend.is_neutral() {
        confidence += TREND_CONFIDENCE;
    }
    if volume.volume_delta > VOLUME_SURGE {
        confidence += VOLUME_CONFIDENCE;
    }
    if order_block_count > 0 {
        confidence += ORDER_BLOCK_CONFIDENCE;
    }
    confidence.min(MAX_TIMEFRAME_CONFIDENCE)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::Candle;

    /// Rising zigzag: closes climb by 1 per candle, highs spike every 5th candle,
    /// lows dip two candles later. Bodies alternate 0.2/0.4 so every pair
    /// starting on an even index forms a bullish order block.
    pub fn rising_zigzag(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                let body = if i % 2 == 0 { 0.2 } else { 0.4 };
                let high = if i % 5 == 0 { close + 5.0 } else { close + 0.5 };
                let low = if i % 5 == 2 { close - 5.0 } else { close - 0.5 };
                let volume = if i + 5 >= n { 300.0 } else { 100.0 };
                Candle {
                    open: close - body,
                    high,
                    low,
                    close,
                    volume,
                    timestamp: i as i64 * 60_000,
                }
            })
            .collect()
    }

    /// Price mirror of `rising_zigzag` around 400
    pub fn falling_zigzag(n: usize) -> Vec<Candle> {
        rising_zigzag(n)
            .into_iter()
            .map(|c| Candle {
                open: 400.0 - c.open,
                high: 400.0 - c.low,
                low: 400.0 - c.high,
                close: 400.0 - c.close,
                volume: c.volume,
                timestamp: c.timestamp,
            })
            .collect()
    }

    pub fn flat(n: usize, price: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 50.0,
                timestamp: i as i64,
            })
            .collect()
    }
}
