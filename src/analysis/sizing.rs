//! Risk-based position sizing

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Units to buy or sell
    pub size: f64,
    /// Account currency lost if the stop is hit
    pub max_loss: f64,
}

/// Size so that hitting `stop_loss` costs `risk_percent` of `balance`.
/// Size is 0 when entry and stop coincide. The engine rejects such plans in
/// `validate_levels` first, so only direct callers see a zero size.
pub fn calculate_position_size(
    risk_percent: f64,
    balance: f64,
    entry: f64,
    stop_loss: f64,
) -> PositionSize {
    let max_loss = balance * risk_percent / 100.0;
    let risk_per_unit = (entry - stop_loss).abs();
    let size = if risk_per_unit == 0.0 { 0.0 } else { max_loss / risk_per_unit };

    PositionSize { size, max_loss }
}
