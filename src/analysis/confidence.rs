//! Cross-timeframe confidence: weighted composite scores plus a confluence bonus

use crate::types::{AnalyzedTimeframe, TimeframeAnalysis, Trend, ZoneKind};

const TREND_SCORE: f64 = 25.0;
const BOS_SCORE: f64 = 15.0;
const CHOCH_SCORE: f64 = 8.0;
const VOLUME_SCALE: f64 = 60.0;
const MAX_VOLUME_SCORE: f64 = 30.0;
const ORDER_BLOCK_SCORE: f64 = 4.0;
const MAX_ORDER_BLOCK_SCORE: f64 = 25.0;
const FVG_SCORE: f64 = 3.0;
const MAX_FVG_SCORE: f64 = 20.0;
const LIQUIDITY_SCORE: f64 = 15.0;
const NEAR_LIQUIDITY_SCORE: f64 = 15.0;
const NEAR_LIQUIDITY_ATR: f64 = 0.5;

const CONFLUENCE_PER_TIMEFRAME: f64 = 8.0;
const MAX_CONFLUENCE_BONUS: f64 = 30.0;

/// Composite 0..=100 score of one timeframe.
///
/// The volume term is `(delta - 1) * 60` capped at 30; it goes negative when
/// recent volume dries up, so the sum is clamped from below as well.
pub fn timeframe_score(analysis: &TimeframeAnalysis) -> f64 {
    let structure = &analysis.market_structure;
    let mut score = 0.0;

    if !structure.trend.is_neutral() {
        score += TREND_SCORE;
    }
    if structure.break_of_structure {
        score += BOS_SCORE;
    }
    if structure.change_of_character {
        score += CHOCH_SCORE;
    }

    score += ((analysis.volume_profile.volume_delta - 1.0) * VOLUME_SCALE).min(MAX_VOLUME_SCORE);
    score += (analysis.order_blocks.len() as f64 * ORDER_BLOCK_SCORE).min(MAX_ORDER_BLOCK_SCORE);
    score += (analysis.fair_value_gaps.len() as f64 * FVG_SCORE).min(MAX_FVG_SCORE);

    if !analysis.liquidity_levels.is_empty() {
        score += LIQUIDITY_SCORE;
        let reach = analysis.average_true_range * NEAR_LIQUIDITY_ATR;
        let near = analysis
            .liquidity_levels
            .iter()
            .any(|level| (analysis.price - level.price).abs() < reach);
        if near {
            score += NEAR_LIQUIDITY_SCORE;
        }
    }

    score.clamp(0.0, 100.0)
}

/// +8 per timeframe whose trend agrees with an order block of the same side,
/// taking the larger of the bullish and bearish counts, capped at 30
pub fn confluence_bonus(timeframes: &[AnalyzedTimeframe]) -> f64 {
    let agreeing = |trend: Trend, kind: ZoneKind| {
        timeframes
            .iter()
            .filter(|tf| tf.analysis.trend == trend && tf.analysis.has_order_block(kind))
            .count()
    };

    let bullish = agreeing(Trend::Bullish, ZoneKind::Bullish);
    let bearish = agreeing(Trend::Bearish, ZoneKind::Bearish);

    (bullish.max(bearish) as f64 * CONFLUENCE_PER_TIMEFRAME).min(MAX_CONFLUENCE_BONUS)
}

/// Weighted mean of timeframe scores in percent, with the confluence bonus
/// added to the weighted sum. 0 when nothing was analyzed.
pub fn overall_confidence(timeframes: &[AnalyzedTimeframe]) -> f64 {
    let (weighted, max_weighted) = timeframes.iter().fold((0.0, 0.0), |(total, max), tf| {
        let weight = tf.timeframe.weight;
        (total + timeframe_score(&tf.analysis) * weight, max + 100.0 * weight)
    });

    if max_weighted <= 0.0 {
        return 0.0;
    }

    let total = weighted + confluence_bonus(timeframes);
    (total / max_weighted * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeframe;
    use crate::types::{
        LevelKind, LevelStrength, LiquidityLevel, MarketStructure, VolumeProfile, Zone,
    };

    fn analysis(trend: Trend) -> TimeframeAnalysis {
        TimeframeAnalysis {
            price: 100.0,
            trend,
            trend_strength: 0.0,
            market_structure: MarketStructure { trend, ..MarketStructure::default() },
            order_blocks: vec![],
            fair_value_gaps: vec![],
            volume_profile: VolumeProfile::default(),
            liquidity_levels: vec![],
            average_true_range: 2.0,
            confidence: 50.0,
        }
    }

    fn block(kind: ZoneKind) -> Zone {
        Zone { kind, high: 101.0, low: 99.0, timestamp: 0, strength: 0.7 }
    }

    fn analyzed(label: &str, weight: f64, analysis: TimeframeAnalysis) -> AnalyzedTimeframe {
        AnalyzedTimeframe { timeframe: Timeframe::new(label, "1h", weight), analysis }
    }

    #[test]
    fn test_score_of_quiet_timeframe_is_zero() {
        assert_eq!(timeframe_score(&analysis(Trend::Neutral)), 0.0);
    }

    #[test]
    fn test_score_components() {
        let mut a = analysis(Trend::Bullish);
        a.market_structure.break_of_structure = true;
        a.volume_profile.volume_delta = 1.25; // +15
        a.order_blocks = vec![block(ZoneKind::Bullish); 2]; // +8
        a.fair_value_gaps = vec![block(ZoneKind::Bullish)]; // +3
        // 25 + 15 + 15 + 8 + 3
        assert!((timeframe_score(&a) - 66.0).abs() < 1e-9);

        a.liquidity_levels = vec![LiquidityLevel {
            kind: LevelKind::Support,
            price: 99.5,
            timestamp: 0,
            strength: LevelStrength::Strong,
        }];
        // +15 present, +15 within 0.5 * ATR of price
        assert!((timeframe_score(&a) - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let mut a = analysis(Trend::Bullish);
        a.market_structure.break_of_structure = true;
        a.market_structure.change_of_character = true;
        a.volume_profile.volume_delta = 5.0;
        a.order_blocks = vec![block(ZoneKind::Bullish); 10];
        a.fair_value_gaps = vec![block(ZoneKind::Bullish); 8];
        assert_eq!(timeframe_score(&a), 100.0);

        let mut dry = analysis(Trend::Neutral);
        dry.volume_profile.volume_delta = 0.1;
        assert_eq!(timeframe_score(&dry), 0.0);
    }

    #[test]
    fn test_confluence_bonus_takes_dominant_side() {
        let mut bull = analysis(Trend::Bullish);
        bull.order_blocks = vec![block(ZoneKind::Bullish)];
        let mut bear = analysis(Trend::Bearish);
        bear.order_blocks = vec![block(ZoneKind::Bearish)];
        let mut mismatched = analysis(Trend::Bullish);
        mismatched.order_blocks = vec![block(ZoneKind::Bearish)];

        let tfs = vec![
            analyzed("D1", 1.5, bull.clone()),
            analyzed("H4", 1.3, bull.clone()),
            analyzed("H1", 1.1, bear),
            analyzed("15M", 0.8, mismatched),
        ];
        assert_eq!(confluence_bonus(&tfs), 16.0);

        let many: Vec<_> = (0..5).map(|_| analyzed("H1", 1.0, bull.clone())).collect();
        assert_eq!(confluence_bonus(&many), 30.0);
    }

    #[test]
    fn test_overall_confidence_weighting() {
        assert_eq!(overall_confidence(&[]), 0.0);

        // Trend-only timeframe scores 25, neutral one scores 0, no confluence
        let tfs = vec![
            analyzed("D1", 1.5, analysis(Trend::Bullish)),
            analyzed("H4", 0.5, analysis(Trend::Neutral)),
        ];
        let expected = (25.0 * 1.5) / (100.0 * 2.0) * 100.0;
        assert!((overall_confidence(&tfs) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_overall_confidence_bounded() {
        let mut strong = analysis(Trend::Bullish);
        strong.market_structure.break_of_structure = true;
        strong.volume_profile.volume_delta = 3.0;
        strong.order_blocks = vec![block(ZoneKind::Bullish); 10];
        strong.fair_value_gaps = vec![block(ZoneKind::Bullish); 8];
        let tfs: Vec<_> = Timeframe::defaults()
            .into_iter()
            .map(|timeframe| AnalyzedTimeframe { timeframe, analysis: strong.clone() })
            .collect();
        let confidence = overall_confidence(&tfs);
        assert!((0.0..=100.0).contains(&confidence));
        assert_eq!(confidence, 100.0);
    }
}
