//! Average true range with Wilder smoothing

use crate::types::Candle;

/// Seeds with the mean of the first `period` true ranges, then
/// `atr = (atr * (period - 1) + tr) / period`. Returns 0 without `period + 1` candles.
pub fn average_true_range(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            curr.range()
                .max((curr.high - prev.close).abs())
                .max((curr.low - prev.close).abs())
        })
        .collect();

    let period_f = period as f64;
    let seed = true_ranges[..period].iter().sum::<f64>() / period_f;

    true_ranges[period..]
        .iter()
        .fold(seed, |atr, tr| (atr * (period_f - 1.0) + tr) / period_f)
}
