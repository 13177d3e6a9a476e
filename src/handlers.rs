//! HTTP keep-alive API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::scanner::Scanner;
use crate::types::{SignalResult, SourceHealth};

/// Application state shared across handlers
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(scanner: Arc<Scanner>) -> Self {
        Self {
            scanner,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
        .route("/signals", get(latest_signals))
        .route("/signals/{symbol}", get(analyze_symbol))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub signals_today: u32,
    pub scanning: bool,
    pub last_scan: Option<DateTime<Utc>>,
}

/// GET / - liveness plus today's signal count
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        signals_today: state.scanner.signals_today().await,
        scanning: state.scanner.is_running(),
        last_scan: state.scanner.last_scan().await,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub sources: Vec<SourceHealth>,
}

/// GET /health - uptime and per-source health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sources = state.scanner.engine().source().health();

    Json(HealthResponse {
        status: overall_status(&sources),
        uptime_secs: state.started_at.elapsed().as_secs(),
        sources,
    })
}

/// "degraded" once every source that has been asked for candles is failing.
/// Sources never reached (fallbacks behind a working primary) are ignored.
pub fn overall_status(sources: &[SourceHealth]) -> &'static str {
    let mut tried = sources.iter().filter(|s| s.requests > 0).peekable();
    if tried.peek().is_none() {
        return "healthy";
    }
    if tried.any(|s| s.is_healthy) {
        "healthy"
    } else {
        "degraded"
    }
}

/// GET /signals - latest scan result per symbol
pub async fn latest_signals(State(state): State<Arc<AppState>>) -> Json<Vec<SignalResult>> {
    Json(state.scanner.latest().await)
}

/// GET /signals/{symbol} - analyze now
pub async fn analyze_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<SignalResult>, (StatusCode, String)> {
    let symbol = normalize_symbol(&symbol)
        .ok_or((StatusCode::BAD_REQUEST, "invalid symbol".to_string()))?;
    info!("On-demand analysis for {}", symbol);
    Ok(Json(state.scanner.engine().analyze_symbol(&symbol).await))
}

/// Uppercase and append USDT when missing. `None` for empty or non-alphanumeric input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if symbol.ends_with("USDT") {
        Some(symbol)
    } else {
        Some(format!("{}USDT", symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ServiceConfig};
    use crate::engine::SignalEngine;
    use crate::sources::{FallbackCandleLoader, PacingPolicy};
    use crate::types::Direction;

    fn state() -> Arc<AppState> {
        // No sources: every fetch fails
        let loader = FallbackCandleLoader::new(PacingPolicy::immediate());
        let engine = Arc::new(SignalEngine::new(Arc::new(loader), EngineConfig::default()));
        let config = ServiceConfig {
            watchlist: vec!["BTCUSDT".to_string()],
            ..ServiceConfig::default()
        };
        let scanner = Scanner::new(engine, &config, PacingPolicy::immediate());
        Arc::new(AppState::new(Arc::new(scanner)))
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("btc").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_symbol("ethusdt").as_deref(), Some("ETHUSDT"));
        assert_eq!(normalize_symbol(" sol ").as_deref(), Some("SOLUSDT"));
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("../etc"), None);
    }

    #[tokio::test]
    async fn test_on_demand_analysis_without_data() {
        let Json(result) = analyze_symbol(State(state()), Path("btc".to_string())).await.unwrap();
        assert_eq!(result.symbol, "BTCUSDT");
        assert_eq!(result.direction, Direction::NoTrade);
        assert_eq!(result.reason.as_deref(), Some("no data available"));
    }

    #[tokio::test]
    async fn test_status_and_signals_start_empty() {
        let state = state();
        let Json(status_body) = status(State(state.clone())).await;
        assert_eq!(status_body.signals_today, 0);
        assert!(!status_body.scanning);
        let Json(signals) = latest_signals(State(state.clone())).await;
        assert!(signals.is_empty());
        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "healthy");
    }

    fn source(name: &str, requests: u64, is_healthy: bool) -> SourceHealth {
        SourceHealth {
            source: name.to_string(),
            is_healthy,
            requests,
            last_success: None,
            last_error: None,
            success_rate: if is_healthy { 1.0 } else { 0.0 },
            last_latency_ms: 0,
        }
    }

    #[test]
    fn test_status_ignores_untried_fallbacks() {
        assert_eq!(overall_status(&[]), "healthy");

        let idle = [
            source("binance-futures", 0, false),
            source("bybit", 0, false),
        ];
        assert_eq!(overall_status(&idle), "healthy");

        let primary_down = [
            source("binance-futures", 3, false),
            source("binance-spot", 3, false),
            source("bybit", 0, false),
        ];
        assert_eq!(overall_status(&primary_down), "degraded");

        let fallback_up = [
            source("binance-futures", 3, false),
            source("binance-spot", 2, true),
            source("bybit", 0, false),
        ];
        assert_eq!(overall_status(&fallback_up), "healthy");
    }

    #[test]
    fn test_router_builds() {
        let _router = router(state());
    }
}
