//! Availability traffic sampler.
//!
//! While an availability trial runs, a background task sends GET requests
//! through the tunnel at a fixed interval and records what came back. The
//! rows show the outage window from the client's side.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kbench_cluster::http_status;
use kbench_core::RequestSample;

/// Handle to a running sampler task.
pub struct TrafficSampler {
    handle: Option<JoinHandle<Vec<RequestSample>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl TrafficSampler {
    /// Spawn the sampling loop against `http://{address}{path}`.
    pub fn start(address: String, path: String, interval: Duration, timeout: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            run_sampler(&address, &path, interval, timeout, shutdown_rx).await
        });
        Self {
            handle: Some(handle),
            shutdown_tx,
        }
    }

    /// Stop sampling and return every recorded row in send order.
    pub async fn stop(mut self) -> Vec<RequestSample> {
        let _ = self.shutdown_tx.send(true);
        let Some(handle) = self.handle.take() else {
            return Vec::new();
        };
        match handle.await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "traffic sampler task failed");
                Vec::new()
            }
        }
    }
}

impl Drop for TrafficSampler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown_tx.send(true);
            handle.abort();
        }
    }
}

async fn run_sampler(
    address: &str,
    path: &str,
    interval: Duration,
    timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Vec<RequestSample> {
    let mut rows = Vec::new();
    debug!(%address, %path, "traffic sampler starting");

    loop {
        let timestamp_ms = epoch_millis();
        let started = Instant::now();
        let status = tokio::select! {
            status = http_status(address, path, timeout) => status,
            _ = shutdown.changed() => break,
        };
        rows.push(RequestSample {
            timestamp_ms,
            status_code: status.unwrap_or(0),
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }

    debug!(samples = rows.len(), "traffic sampler stopped");
    rows
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_failures_against_closed_port() {
        let sampler = TrafficSampler::start(
            "127.0.0.1:1".to_string(),
            "/healthz".to_string(),
            Duration::from_millis(10),
            Duration::from_millis(50),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        let rows = sampler.stop().await;

        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.status_code == 0 && !r.is_success()));
        assert!(rows.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    }

    #[tokio::test]
    async fn stop_right_away_returns_promptly() {
        let sampler = TrafficSampler::start(
            "127.0.0.1:1".to_string(),
            "/healthz".to_string(),
            Duration::from_secs(60),
            Duration::from_millis(50),
        );
        let rows = tokio::time::timeout(Duration::from_secs(2), sampler.stop())
            .await
            .unwrap();
        assert!(rows.len() <= 1);
    }
}
