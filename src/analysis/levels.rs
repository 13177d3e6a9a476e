//! Entry, stop-loss and take-profit planning with risk validation

use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::types::{Direction, LevelKind, SignalError, TimeframeAnalysis, ZoneKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Reward over risk, rounded to 2 decimals
    pub risk_reward: f64,
}

/// Plan levels for a LONG or SHORT on one timeframe's analysis
pub fn plan_levels(
    direction: Direction,
    price: f64,
    analysis: &TimeframeAnalysis,
    config: &LevelConfig,
) -> Result<TradeLevels, SignalError> {
    let side = match direction {
        Direction::Long => 1.0,
        Direction::Short => -1.0,
        other => return Err(SignalError::Internal(format!("cannot plan levels for {other}"))),
    };
    let atr = analysis.average_true_range;

    let entry = if side > 0.0 {
        long_entry(price, analysis, config)
    } else {
        short_entry(price, analysis, config)
    };
    let stop_loss = stop_loss(side, entry, atr, analysis, config);
    let take_profit = take_profit(side, entry, stop_loss, atr, analysis, config);

    validate_levels(entry, stop_loss, take_profit, atr, config)
}

fn long_entry(price: f64, analysis: &TimeframeAnalysis, config: &LevelConfig) -> f64 {
    let block = analysis
        .order_blocks
        .iter()
        .filter(|ob| ob.kind == ZoneKind::Bullish)
        .filter(|ob| price > ob.low && price < ob.high * (1.0 + config.order_block_tolerance))
        .reduce(|best, ob| if ob.strength > best.strength { ob } else { best });
    if let Some(block) = block {
        return block.low * (1.0 - config.order_block_entry_offset);
    }

    let gap = analysis
        .fair_value_gaps
        .iter()
        .find(|fvg| fvg.kind == ZoneKind::Bullish && price > fvg.low && price < fvg.high);
    if let Some(gap) = gap {
        return gap.low.max(price * (1.0 - config.fair_value_gap_entry_offset));
    }

    let support = analysis.supports().filter(|&p| p < price).reduce(f64::max);
    if let Some(support) = support {
        return support * (1.0 + config.level_entry_offset);
    }

    price * (1.0 - config.market_entry_offset)
}

fn short_entry(price: f64, analysis: &TimeframeAnalysis, config: &LevelConfig) -> f64 {
    let block = analysis
        .order_blocks
        .iter()
        .filter(|ob| ob.kind == ZoneKind::Bearish)
        .filter(|ob| price < ob.high && price > ob.low * (1.0 - config.order_block_tolerance))
        .reduce(|best, ob| if ob.strength > best.strength { ob } else { best });
    if let Some(block) = block {
        return block.high * (1.0 + config.order_block_entry_offset);
    }

    let gap = analysis
        .fair_value_gaps
        .iter()
        .find(|fvg| fvg.kind == ZoneKind::Bearish && price < fvg.high && price > fvg.low);
    if let Some(gap) = gap {
        return gap.high.min(price * (1.0 + config.fair_value_gap_entry_offset));
    }

    let resistance = analysis.resistances().filter(|&p| p > price).reduce(f64::min);
    if let Some(resistance) = resistance {
        return resistance * (1.0 - config.level_entry_offset);
    }

    price * (1.0 + config.market_entry_offset)
}

/// Nearest level on the given side of `entry` within `max_distance`, as (price, distance)
fn nearest_level(
    levels: impl Iterator<Item = f64>,
    entry: f64,
    direction: f64,
    max_distance: f64,
) -> Option<(f64, f64)> {
    levels
        .map(|p| (p, (p - entry) * direction))
        .filter(|&(_, distance)| distance > 0.0 && distance <= max_distance)
        .reduce(|nearest, candidate| if candidate.1 < nearest.1 { candidate } else { nearest })
}

/// Stop behind the nearest protective level, never farther than the ATR default
fn stop_loss(
    side: f64,
    entry: f64,
    atr: f64,
    analysis: &TimeframeAnalysis,
    config: &LevelConfig,
) -> f64 {
    let protective = if side > 0.0 { LevelKind::Support } else { LevelKind::Resistance };

    let search = config.stop_search_atr * atr;
    match nearest_level(analysis.levels_of(protective), entry, -side, search) {
        Some((level, distance)) if distance <= config.stop_level_atr * atr => level,
        Some(_) => entry - side * config.stop_level_atr * atr,
        None => entry - side * config.stop_default_atr * atr,
    }
}

/// Target at the nearest opposing level, clamped to 1.2..2.0 times the risk
fn take_profit(
    side: f64,
    entry: f64,
    stop_loss: f64,
    atr: f64,
    analysis: &TimeframeAnalysis,
    config: &LevelConfig,
) -> f64 {
    let opposing = if side > 0.0 { LevelKind::Resistance } else { LevelKind::Support };

    let risk = (entry - stop_loss).abs();
    let search = config.target_search_atr * atr;
    let reward = nearest_level(analysis.levels_of(opposing), entry, side, search)
        .map(|(_, distance)| distance)
        .unwrap_or(config.target_default_atr * atr)
        .max(risk * config.min_target_risk)
        .min(risk * config.max_target_risk);

    entry + side * reward
}

/// Pull stop and target back within `max_distance_atr`, then reset the target
/// when risk:reward leaves the accepted band
pub fn validate_levels(
    entry: f64,
    mut stop_loss: f64,
    mut take_profit: f64,
    atr: f64,
    config: &LevelConfig,
) -> Result<TradeLevels, SignalError> {
    let max_distance = config.max_distance_atr * atr;

    if (entry - stop_loss).abs() > max_distance {
        stop_loss = if entry > stop_loss {
            entry - config.reset_stop_atr * atr
        } else {
            entry + config.reset_stop_atr * atr
        };
    }

    if (entry - take_profit).abs() > max_distance {
        take_profit = if entry < take_profit {
            entry + config.reset_target_atr * atr
        } else {
            entry - config.reset_target_atr * atr
        };
    }

    let risk = (entry - stop_loss).abs();
    if risk == 0.0 {
        return Err(SignalError::DegenerateLevels(entry));
    }

    let mut risk_reward = (take_profit - entry).abs() / risk;
    if risk_reward < config.min_risk_reward {
        take_profit = entry + (entry - stop_loss) * config.low_rr_reset;
    } else if risk_reward > config.max_risk_reward {
        take_profit = entry + (entry - stop_loss) * config.high_rr_reset;
    }
    risk_reward = (take_profit - entry).abs() / risk;

    let levels = TradeLevels {
        entry,
        stop_loss,
        take_profit,
        risk_reward: (risk_reward * 100.0).round() / 100.0,
    };

    if [levels.entry, levels.stop_loss, levels.take_profit, levels.risk_reward]
        .iter()
        .all(|v| v.is_finite())
    {
        Ok(levels)
    } else {
        Err(SignalError::Internal(format!("non-finite levels {levels:?}")))
    }
}
