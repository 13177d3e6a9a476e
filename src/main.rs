use anyhow::Context;
use std::sync::Arc;
use tracing::{info, Level};

use signal_engine::handlers::{self, AppState};
use signal_engine::{
    EngineConfig, FallbackCandleLoader, PacingPolicy, Scanner, ServiceConfig, SignalEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Signal Engine...");

    let config = ServiceConfig::load().context("failed to load configuration")?;

    let loader =
        FallbackCandleLoader::from_config(&config).context("failed to build candle sources")?;
    info!("✓ Candle sources: {}", loader.source_names().join(" -> "));

    let engine = Arc::new(SignalEngine::new(Arc::new(loader), EngineConfig::default()));
    let scanner = Arc::new(Scanner::new(engine, &config, PacingPolicy::from_config(&config)));

    tokio::spawn(Arc::clone(&scanner).run());
    info!(
        "✓ Scanner started: {} symbols every {}s",
        config.watchlist.len(),
        config.scan_interval_secs
    );

    let app = handlers::router(Arc::new(AppState::new(scanner)));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("🚀 Signal Engine listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
