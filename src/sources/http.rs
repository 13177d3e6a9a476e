//! Shared HTTP plumbing for kline endpoints

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::{Result, SourceError, SourceHealth};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Outcome counters for one kline endpoint, read by `health()`
#[derive(Debug, Default)]
pub struct FetchHealth {
    requests: AtomicU64,
    failures: AtomicU64,
    /// Epoch millis of the last decoded response, 0 before the first
    last_ok_ms: AtomicU64,
    last_failed_ms: AtomicU64,
    last_latency_ms: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl FetchHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ok(&self, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.last_latency_ms.store(latency.as_millis() as u64, Ordering::Relaxed);
        self.last_ok_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn record_failed(&self, error: &SourceError) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.last_failed_ms.store(now_ms(), Ordering::Relaxed);
        if let Ok(mut last_error) = self.last_error.lock() {
            *last_error = Some(error.to_string());
        }
    }

    /// Kline requests issued so far, successful or not
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// The latest request decoded candles
    pub fn is_healthy(&self) -> bool {
        let last_ok = self.last_ok_ms.load(Ordering::Relaxed);
        last_ok > 0 && last_ok >= self.last_failed_ms.load(Ordering::Relaxed)
    }

    /// Share of requests that decoded, 1 before the first request
    pub fn success_rate(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            return 1.0;
        }
        let failures = self.failures.load(Ordering::Relaxed).min(requests);
        (requests - failures) as f64 / requests as f64
    }

    pub fn snapshot(&self, source: &str) -> SourceHealth {
        let is_healthy = self.is_healthy();
        let last_error = if is_healthy {
            None
        } else {
            self.last_error.lock().ok().and_then(|e| e.clone())
        };

        SourceHealth {
            source: source.to_string(),
            is_healthy,
            requests: self.requests(),
            last_success: match self.last_ok_ms.load(Ordering::Relaxed) {
                0 => None,
                ms => DateTime::from_timestamp_millis(ms as i64),
            },
            last_error,
            success_rate: self.success_rate(),
            last_latency_ms: self.last_latency_ms.load(Ordering::Relaxed),
        }
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// JSON GET client for one named source
pub struct JsonFetcher {
    client: Client,
    source_name: String,
    timeout: Duration,
    health: FetchHealth,
}

impl JsonFetcher {
    pub fn new(source_name: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            source_name: source_name.to_string(),
            timeout,
            health: FetchHealth::new(),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn health(&self) -> SourceHealth {
        self.health.snapshot(&self.source_name)
    }

    /// GET `url` with `query` and decode the JSON body.
    ///
    /// 418 and 429 become `RateLimit`; any other non-2xx is an `ApiError`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let started = Instant::now();
        debug!("{} GET {} {:?}", self.source_name, url, query);

        let outcome = self.request(url, query).await;
        match &outcome {
            Ok(_) => self.health.record_ok(started.elapsed()),
            Err(e) => self.health.record_failed(e),
        }
        outcome
    }

    async fn request<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(SourceError::ApiError(format!(
                    "{} request failed: {}",
                    self.source_name, e
                )));
            }
            Err(_) => {
                return Err(SourceError::ApiError(format!(
                    "{} request timed out after {}s",
                    self.source_name,
                    self.timeout.as_secs()
                )));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(SourceError::RateLimit {
                source_name: self.source_name.clone(),
                retry_after,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(format!(
                "{} API error ({}): {}",
                self.source_name, status, text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("{}: {}", self.source_name, e)))
    }
}
