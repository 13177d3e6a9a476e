//! Signal orchestration: fetch every timeframe, analyze, aggregate, plan

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::analysis::{
    analyze_timeframe, calculate_position_size, direction_from_bias, multi_timeframe_bias,
    overall_confidence,
    plan_levels,
};
use crate::config::{AnalysisConfig, EngineConfig, Timeframe};
use crate::types::{
    AnalyzedTimeframe, Candle, CandleSource, Direction, SignalError, SignalResult, TimeframeOutcome,
};

/// Multi-timeframe signal engine over a single candle provider
pub struct SignalEngine {
    source: Arc<dyn CandleSource>,
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(source: Arc<dyn CandleSource>, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn CandleSource> {
        &self.source
    }

    /// Analyze one symbol. Never fails: every error ends in a NO_TRADE result.
    pub async fn analyze_symbol(&self, symbol: &str) -> SignalResult {
        let outcomes = self.collect_timeframes(symbol).await;
        let analyzed: Vec<AnalyzedTimeframe> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                TimeframeOutcome::Analyzed(tf) => Some(tf),
                TimeframeOutcome::Skipped { .. } => None,
            })
            .collect();

        match evaluate(symbol, &analyzed, &self.config) {
            Ok(result) => {
                info!("{}: {} ({}%)", symbol, result.direction, result.confidence);
                result
            }
            Err(e) => {
                info!("{}: no trade, {}", symbol, e);
                SignalResult::no_trade(symbol, e.confidence(), e.to_string())
            }
        }
    }

    /// Fetch and analyze each configured timeframe in order, one at a time.
    /// A failed fetch skips that timeframe.
    pub async fn collect_timeframes(&self, symbol: &str) -> Vec<TimeframeOutcome> {
        let mut outcomes = Vec::with_capacity(self.config.timeframes.len());

        for timeframe in &self.config.timeframes {
            let outcome = match self
                .source
                .fetch_candles(symbol, &timeframe.interval, self.config.candle_limit)
                .await
            {
                Ok(candles) => analyze_candles(timeframe, &candles, &self.config.analysis),
                Err(e) => TimeframeOutcome::Skipped {
                    timeframe: timeframe.clone(),
                    reason: e.to_string(),
                },
            };

            if let TimeframeOutcome::Skipped { timeframe, reason } = &outcome {
                let unavailable = SignalError::DataUnavailable {
                    timeframe: timeframe.label.clone(),
                    reason: reason.clone(),
                };
                warn!("Skipping {} for {}: {}", timeframe.label, symbol, unavailable);
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}

fn analyze_candles(
    timeframe: &Timeframe,
    candles: &[Candle],
    config: &AnalysisConfig,
) -> TimeframeOutcome {
    let skipped = |reason: &str| TimeframeOutcome::Skipped {
        timeframe: timeframe.clone(),
        reason: reason.to_string(),
    };

    if !candles.iter().all(Candle::is_finite) {
        return skipped("candles contain non-finite values");
    }

    match analyze_timeframe(candles, config) {
        Some(analysis) => TimeframeOutcome::Analyzed(AnalyzedTimeframe {
            timeframe: timeframe.clone(),
            analysis,
        }),
        None => skipped("no candles"),
    }
}

/// Decide a signal from the timeframes that produced an analysis.
///
/// Order of checks: no data, confidence floor, neutral bias, primary
/// timeframe, level planning.
pub fn evaluate(
    symbol: &str,
    timeframes: &[AnalyzedTimeframe],
    config: &EngineConfig,
) -> Result<SignalResult, SignalError> {
    let first = timeframes.first().ok_or(SignalError::NoTimeframesAvailable)?;
    let current_price = first.analysis.price;

    let bias = multi_timeframe_bias(timeframes);
    let confidence = overall_confidence(timeframes);
    let reported = confidence.round().clamp(0.0, 100.0) as u8;
    debug!("{}: bias {:.2}, confidence {:.1}", symbol, bias, confidence);

    if confidence < config.min_confidence {
        return Err(SignalError::LowConfidence {
            confidence: reported,
            minimum: config.min_confidence.round() as u8,
        });
    }

    let direction = direction_from_bias(bias, config.bias_threshold);
    if direction == Direction::Neutral {
        return Ok(SignalResult::neutral(symbol, reported));
    }

    let primary = timeframes
        .iter()
        .find(|tf| tf.analysis.confidence > config.primary_confidence)
        .or(timeframes.first())
        .ok_or(SignalError::NoValidAnalysis)?;

    let levels = plan_levels(direction, current_price, &primary.analysis, &config.levels)?;
    let position = calculate_position_size(
        config.risk.risk_percent,
        config.risk.account_balance,
        levels.entry,
        levels.stop_loss,
    );

    Ok(SignalResult {
        symbol: symbol.to_string(),
        direction,
        confidence: reported,
        entry: Some(levels.entry),
        stop_loss: Some(levels.stop_loss),
        take_profit: Some(levels.take_profit),
        risk_reward: Some(levels.risk_reward),
        position_size: Some(position.size),
        max_loss: Some(position.max_loss),
        timeframe: Some(primary.timeframe.label.clone()),
        reason: None,
        generated_at: Utc::now(),
    })
}
