//! Volume profile: point of control and recent volume delta

use std::collections::BTreeMap;

use crate::types::{Candle, VolumeProfile};

const RECENT_WINDOW: usize = 5;
const BASELINE_WINDOW: usize = 15;

/// Spread each candle's volume evenly over `buckets` price levels of its range.
/// Keys are prices scaled by `10^decimals` and rounded. Zero-range candles are skipped.
pub fn volume_by_price(candles: &[Candle], buckets: usize, decimals: u32) -> BTreeMap<i64, f64> {
    let mut by_price = BTreeMap::new();
    if buckets == 0 {
        return by_price;
    }

    let scale = 10f64.powi(decimals as i32);
    let share = 1.0 / buckets as f64;

    for candle in candles.iter().filter(|c| c.range() != 0.0) {
        let step = candle.range() / buckets as f64;
        for i in 0..buckets {
            let level = candle.low + step * i as f64;
            let key = (level * scale).round() as i64;
            *by_price.entry(key).or_insert(0.0) += candle.volume * share;
        }
    }

    by_price
}

pub fn analyze_volume_profile(candles: &[Candle], buckets: usize, decimals: u32) -> VolumeProfile {
    if candles.is_empty() {
        return VolumeProfile::default();
    }

    let by_price = volume_by_price(candles, buckets, decimals);
    let scale = 10f64.powi(decimals as i32);

    // Ties resolve to the lowest price
    let mut point_of_control = 0.0;
    let mut max_volume = 0.0;
    for (&key, &volume) in &by_price {
        if volume > max_volume {
            max_volume = volume;
            point_of_control = key as f64 / scale;
        }
    }

    let total_volume: f64 = candles
        .iter()
        .filter(|c| c.range() != 0.0)
        .map(|c| c.volume)
        .sum();

    VolumeProfile {
        point_of_control,
        total_volume,
        average_volume: total_volume / candles.len() as f64,
        volume_delta: volume_delta(candles),
    }
}

/// Mean volume of the last 5 candles over the mean of the 15 before them
pub fn volume_delta(candles: &[Candle]) -> f64 {
    let needed = RECENT_WINDOW + BASELINE_WINDOW;
    if candles.len() < needed {
        return 1.0;
    }

    let tail = &candles[candles.len() - needed..];
    let (baseline, recent) = tail.split_at(BASELINE_WINDOW);

    let recent_avg = recent.iter().map(|c| c.volume).sum::<f64>() / RECENT_WINDOW as f64;
    let baseline_avg = baseline.iter().map(|c| c.volume).sum::<f64>() / BASELINE_WINDOW as f64;

    if baseline_avg == 0.0 {
        1.0
    } else {
        recent_avg / baseline_avg
    }
}
