//! Plain-text rendering of signal results

use crate::types::{Direction, SignalResult};

const RISK_NOTE: &str = "Risk at most 2-3% per trade. Signals are for reference only.";

/// Prices above 10 get 2 decimals, smaller ones 4
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            if v > 10.0 {
                format!("{:.2}", v)
            } else {
                format!("{:.4}", v)
            }
        }
        _ => "N/A".to_string(),
    }
}

/// Ticker without the quote suffix ("BTCUSDT" -> "BTC")
pub fn base_asset(symbol: &str) -> &str {
    symbol.strip_suffix("USDT").filter(|s| !s.is_empty()).unwrap_or(symbol)
}

/// Message for the `index`-th signal of the day
pub fn format_signal_message(result: &SignalResult, index: u32) -> String {
    if !result.is_trade() {
        return format!(
            "#{} [{}] conf {}%: {}",
            base_asset(&result.symbol),
            result.direction,
            result.confidence,
            result.reason.as_deref().unwrap_or("no reason given")
        );
    }

    let icon = if result.direction == Direction::Long { "🟢" } else { "🔴" };
    let rr = result
        .risk_reward
        .map(|rr| format!("{:.2}", rr))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Signal #{} today\n\
         #{} [{}]\n\
         \n\
         {} Entry: {}\n\
         Take Profit: {}\n\
         Stop-Loss: {}\n\
         RR: {} (Conf: {}%)\n\
         \n\
         {}",
        index,
        base_asset(&result.symbol),
        result.direction,
        icon,
        format_price(result.entry),
        format_price(result.take_profit),
        format_price(result.stop_loss),
        rr,
        result.confidence,
        RISK_NOTE
    )
}
