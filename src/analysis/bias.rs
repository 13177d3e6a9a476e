//! Directional bias across timeframes

use crate::types::{AnalyzedTimeframe, Direction};

const BOS_FACTOR: f64 = 0.5;

/// Signed sum of timeframe weights by trend, plus half a weight for each
/// break of structure signed by that timeframe's structural trend
pub fn multi_timeframe_bias(timeframes: &[AnalyzedTimeframe]) -> f64 {
    timeframes
        .iter()
        .map(|tf| {
            let weight = tf.timeframe.weight;
            let analysis = &tf.analysis;
            let mut bias = analysis.trend.sign() * weight;
            if analysis.market_structure.break_of_structure {
                bias += analysis.market_structure.trend.sign() * weight * BOS_FACTOR;
            }
            bias
        })
        .sum()
}

/// LONG above `threshold`, SHORT below `-threshold`, NEUTRAL in between
pub fn direction_from_bias(bias: f64, threshold: f64) -> Direction {
    if bias > threshold {
        Direction::Long
    } else if bias < -threshold {
        Direction::Short
    } else {
        Direction::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeframe;
    use crate::types::{MarketStructure, TimeframeAnalysis, Trend, VolumeProfile};

    fn tf(weight: f64, trend: Trend, bos: bool) -> AnalyzedTimeframe {
        AnalyzedTimeframe {
            timeframe: Timeframe::new("X", "1h", weight),
            analysis: TimeframeAnalysis {
                price: 1.0,
                trend,
                trend_strength: 0.0,
                market_structure: MarketStructure {
                    trend,
                    break_of_structure: bos,
                    ..MarketStructure::default()
                },
                order_blocks: vec![],
                fair_value_gaps: vec![],
                volume_profile: VolumeProfile::default(),
                liquidity_levels: vec![],
                average_true_range: 0.0,
                confidence: 50.0,
            },
        }
    }

    #[test]
    fn test_bias_sums_own_weights() {
        let tfs = vec![
            tf(1.5, Trend::Bullish, true),
            tf(1.3, Trend::Bearish, false),
            tf(0.8, Trend::Neutral, false),
        ];
        // 1.5 + 0.75 - 1.3
        assert!((multi_timeframe_bias(&tfs) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_skipped_timeframes_keep_their_weights() {
        // Only H1 and 15M analyzed: weights must stay 1.1 and 0.8
        let tfs = vec![tf(1.1, Trend::Bearish, true), tf(0.8, Trend::Bearish, false)];
        assert!((multi_timeframe_bias(&tfs) + (1.1 * 1.5 + 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_direction_thresholds() {
        assert_eq!(direction_from_bias(0.51, 0.5), Direction::Long);
        assert_eq!(direction_from_bias(-0.51, 0.5), Direction::Short);
        assert_eq!(direction_from_bias(0.5, 0.5), Direction::Neutral);
        assert_eq!(direction_from_bias(-0.5, 0.5), Direction::Neutral);
        assert_eq!(direction_from_bias(0.0, 0.5), Direction::Neutral);
    }
}
