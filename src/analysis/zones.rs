//! Order block and fair value gap detection

use crate::types::{Candle, FairValueGap, OrderBlock, Zone, ZoneKind};

/// Two same-direction candles where the second body outgrows the first by `body_ratio`.
/// The first candle's range becomes the block. Keeps the `max_blocks` most recent.
pub fn find_order_blocks(
    candles: &[Candle],
    body_ratio: f64,
    strength: f64,
    max_blocks: usize,
) -> Vec<OrderBlock> {
    if candles.len() < 3 {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    for pair in candles.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if next.body() <= current.body() * body_ratio {
            continue;
        }

        let kind = if current.is_bearish() && next.is_bearish() {
            ZoneKind::Bearish
        } else if current.is_bullish() && next.is_bullish() {
            ZoneKind::Bullish
        } else {
            continue;
        };

        blocks.push(Zone {
            kind,
            high: current.high,
            low: current.low,
            timestamp: current.timestamp,
            strength,
        });
    }

    keep_most_recent(blocks, max_blocks)
}

/// Three-candle imbalances where the middle candle clears both neighbors
pub fn find_fair_value_gaps(
    candles: &[Candle],
    strength: f64,
    max_gaps: usize,
) -> Vec<FairValueGap> {
    if candles.len() < 3 {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    for triplet in candles.windows(3) {
        let (prev, curr, next) = (&triplet[0], &triplet[1], &triplet[2]);

        if curr.low > prev.high.max(next.high) {
            gaps.push(Zone {
                kind: ZoneKind::Bullish,
                high: prev.low.min(next.low),
                low: curr.high,
                timestamp: curr.timestamp,
                strength,
            });
        }

        if curr.high < prev.low.min(next.low) {
            gaps.push(Zone {
                kind: ZoneKind::Bearish,
                high: curr.low,
                low: prev.high.max(next.high),
                timestamp: curr.timestamp,
                strength,
            });
        }
    }

    keep_most_recent(gaps, max_gaps)
}

pub(crate) fn keep_most_recent<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    if items.len() > max {
        items.drain(..items.len() - max);
    }
    items
}
