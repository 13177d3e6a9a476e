//! Swing point detection

use crate::types::{Candle, SwingPoint};

/// True if `highs[index]` is strictly above every in-bounds neighbor within `lookback`.
/// Neighbors beyond the series edge are ignored; equal neighbors disqualify.
pub fn is_swing_high(highs: &[f64], index: usize, lookback: usize) -> bool {
    is_extremum(highs, index, lookback, |candidate, neighbor| candidate > neighbor)
}

/// True if `lows[index]` is strictly below every in-bounds neighbor within `lookback`.
pub fn is_swing_low(lows: &[f64], index: usize, lookback: usize) -> bool {
    is_extremum(lows, index, lookback, |candidate, neighbor| candidate < neighbor)
}

fn is_extremum(
    values: &[f64],
    index: usize,
    lookback: usize,
    beats: impl Fn(f64, f64) -> bool,
) -> bool {
    let Some(&candidate) = values.get(index) else {
        return false;
    };

    (1..=lookback).all(|offset| {
        let before = index.checked_sub(offset).map(|i| values[i]);
        let after = values.get(index + offset).copied();
        before.map_or(true, |v| beats(candidate, v)) && after.map_or(true, |v| beats(candidate, v))
    })
}

/// Swing highs and lows over indices with `margin` candles on both sides
pub fn find_swings(
    candles: &[Candle],
    lookback: usize,
    margin: usize,
) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    let mut swing_highs = Vec::new();
    let mut swing_lows = Vec::new();

    for i in margin..candles.len().saturating_sub(margin) {
        if is_swing_high(&highs, i, lookback) {
            swing_highs.push(SwingPoint {
                index: i,
                price: highs[i],
                timestamp: candles[i].timestamp,
            });
        }
        if is_swing_low(&lows, i, lookback) {
            swing_lows.push(SwingPoint {
                index: i,
                price: lows[i],
                timestamp: candles[i].timestamp,
            });
        }
    }

    (swing_highs, swing_lows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swing_high_strict() {
        let highs = [1.0, 2.0, 5.0, 2.0, 1.0];
        assert!(is_swing_high(&highs, 2, 2));
        assert!(!is_swing_high(&highs, 1, 2));

        // An equal neighbor never validates a swing
        let flat_top = [1.0, 5.0, 5.0, 1.0];
        assert!(!is_swing_high(&flat_top, 1, 2));
        assert!(!is_swing_high(&flat_top, 2, 2));
    }

    #[test]
    fn test_swing_low_strict() {
        let lows = [5.0, 4.0, 1.0, 4.0, 5.0];
        assert!(is_swing_low(&lows, 2, 2));
        assert!(!is_swing_low(&[3.0, 1.0, 1.0, 3.0], 1, 1));
    }

    #[test]
    fn test_missing_neighbors_do_not_disqualify() {
        let highs = [5.0, 1.0, 1.0];
        assert!(is_swing_high(&highs, 0, 3));
        assert!(is_swing_low(&[3.0, 2.0, 1.0], 2, 3));
        assert!(!is_swing_high(&highs, 7, 3));
    }

    #[test]
    fn test_swing_property_holds_for_every_match() {
        let highs: Vec<f64> = (0..40)
            .map(|i| ((i * 7) % 11) as f64 + (i % 3) as f64 * 0.5)
            .collect();
        for lookback in 1..4 {
            for i in 0..highs.len() {
                if is_swing_high(&highs, i, lookback) {
                    let lo = i.saturating_sub(lookback);
                    let hi = (i + lookback).min(highs.len() - 1);
                    for j in lo..=hi {
                        if j != i {
                            assert!(highs[i] > highs[j], "index {} lookback {}", i, lookback);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_find_swings_skips_edges() {
        let candles: Vec<Candle> = [9.0, 1.0, 2.0, 6.0, 2.0, 1.0, 9.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle {
                open: p,
                high: p,
                low: p,
                close: p,
                volume: 1.0,
                timestamp: i as i64,
            })
            .collect();

        let (highs, lows) = find_swings(&candles, 2, 2);
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, 3);
        assert!(lows.is_empty());
    }
}
