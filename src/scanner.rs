//! Periodic watchlist scan over the signal engine

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ServiceConfig;
use crate::engine::SignalEngine;
use crate::format::format_signal_message;
use crate::sources::PacingPolicy;
use crate::types::SignalResult;

/// Local-time window in which scans run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingWindow {
    pub offset: FixedOffset,
    pub open_hour: u32,
    pub close_hour: u32,
    pub close_minute: u32,
}

impl OperatingWindow {
    pub fn from_config(config: &ServiceConfig) -> Self {
        // Out-of-range offsets fall back to UTC
        let offset =
            FixedOffset::east_opt(config.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            open_hour: config.open_hour,
            close_hour: config.close_hour,
            close_minute: config.close_minute,
        }
    }

    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Inclusive on both ends: 04:00 and 23:30 are inside
    pub fn contains(&self, local: &DateTime<FixedOffset>) -> bool {
        let (hour, minute) = (local.hour(), local.minute());
        hour >= self.open_hour
            && (hour < self.close_hour || (hour == self.close_hour && minute <= self.close_minute))
    }
}

/// Signal numbering that restarts every local day
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DailyCounter {
    date: Option<NaiveDate>,
    count: u32,
}

impl DailyCounter {
    /// Next signal number for `date`
    pub fn next(&mut self, date: NaiveDate) -> u32 {
        self.roll(date);
        self.count += 1;
        self.count
    }

    pub fn count_on(&self, date: NaiveDate) -> u32 {
        if self.date == Some(date) { self.count } else { 0 }
    }

    fn roll(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.date = Some(date);
            self.count = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub analyzed: usize,
    pub signals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    AlreadyRunning,
    OutsideHours,
}

#[derive(Debug, Default)]
struct ScanState {
    latest: HashMap<String, SignalResult>,
    counter: DailyCounter,
    last_scan: Option<DateTime<Utc>>,
}

/// Clears the running flag when a scan ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Scanner {
    engine: Arc<SignalEngine>,
    watchlist: Vec<String>,
    window: OperatingWindow,
    pacing: PacingPolicy,
    scan_interval: Duration,
    startup_delay: Duration,
    running: AtomicBool,
    state: RwLock<ScanState>,
}

impl Scanner {
    pub fn new(engine: Arc<SignalEngine>, config: &ServiceConfig, pacing: PacingPolicy) -> Self {
        Self {
            engine,
            watchlist: config.watchlist.clone(),
            window: OperatingWindow::from_config(config),
            pacing,
            scan_interval: config.scan_interval(),
            startup_delay: Duration::from_secs(config.startup_delay_secs),
            running: AtomicBool::new(false),
            state: RwLock::new(ScanState::default()),
        }
    }

    pub fn engine(&self) -> &Arc<SignalEngine> {
        &self.engine
    }

    pub fn window(&self) -> OperatingWindow {
        self.window
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Scan ticker; never returns
    pub async fn run(self: Arc<Self>) {
        tokio::time::sleep(self.startup_delay).await;

        let mut ticker = tokio::time::interval(self.scan_interval.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            match self.scan_once().await {
                ScanOutcome::Completed(summary) => info!(
                    "Scan completed: {} symbols analyzed, {} signals",
                    summary.analyzed, summary.signals
                ),
                ScanOutcome::AlreadyRunning => info!("Scan already running, skipping"),
                ScanOutcome::OutsideHours => info!("Outside operating hours, sleeping"),
            }
        }
    }

    pub async fn scan_once(&self) -> ScanOutcome {
        self.scan_at(self.window.local_now()).await
    }

    /// Scan the watchlist as if the local time were `now`
    pub async fn scan_at(&self, now: DateTime<FixedOffset>) -> ScanOutcome {
        if !self.window.contains(&now) {
            return ScanOutcome::OutsideHours;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return ScanOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(&self.running);

        info!("Starting scan at {} over {} symbols", now.format("%H:%M"), self.watchlist.len());
        let min_confidence = self.engine.config().min_confidence;
        let mut summary = ScanSummary { analyzed: 0, signals: 0 };

        for (i, symbol) in self.watchlist.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing.symbol_delay).await;
            }

            let result = self.engine.analyze_symbol(symbol).await;
            summary.analyzed += 1;

            let mut state = self.state.write().await;
            if is_signal(&result, min_confidence) {
                let index = state.counter.next(now.date_naive());
                summary.signals += 1;
                info!("Signal found:\n{}", format_signal_message(&result, index));
            } else if result.is_trade() {
                info!(
                    "Skip {}: confidence {}% below {}%",
                    symbol, result.confidence, min_confidence
                );
            }
            state.latest.insert(symbol.clone(), result);
        }

        self.state.write().await.last_scan = Some(Utc::now());
        ScanOutcome::Completed(summary)
    }

    /// Latest result per symbol, sorted by symbol
    pub async fn latest(&self) -> Vec<SignalResult> {
        let state = self.state.read().await;
        let mut results: Vec<SignalResult> = state.latest.values().cloned().collect();
        results.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        results
    }

    pub async fn latest_for(&self, symbol: &str) -> Option<SignalResult> {
        self.state.read().await.latest.get(symbol).cloned()
    }

    pub async fn signals_today(&self) -> u32 {
        let today = self.window.local_now().date_naive();
        self.state.read().await.counter.count_on(today)
    }

    pub async fn last_scan(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_scan
    }
}

/// LONG/SHORT with confidence in [min_confidence, 100]
pub fn is_signal(result: &SignalResult, min_confidence: f64) -> bool {
    result.is_trade() && f64::from(result.confidence) >= min_confidence && result.confidence <= 100
}
