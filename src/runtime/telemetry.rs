use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters used to derive runtime metrics.
#[derive(Default, Debug)]
pub struct Telemetry {
    api_calls: AtomicU64,
    events_received: AtomicU64,
    fetch_errors: AtomicU64,
    completed_cycles: AtomicU64,
}

impl Telemetry {
    /// Records one remote page request.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the number of events carried by a fetched page.
    pub fn record_events_received(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.events_received.fetch_add(count, Ordering::Relaxed);
    }

    /// Records a task that aborted on a remote-call error.
    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one fully distributed scan cycle.
    pub fn record_completed_cycle(&self) {
        self.completed_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            api_calls: self.api_calls.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            completed_cycles: self.completed_cycles.load(Ordering::Relaxed),
        }
    }

    pub fn api_calls(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn fetch_errors(&self) -> u64 {
        self.fetch_errors.load(Ordering::Relaxed)
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub api_calls: u64,
    pub events_received: u64,
    pub fetch_errors: u64,
    pub completed_cycles: u64,
}

/// Spawns a background task that periodically logs API-call volume, event
/// throughput, and fetch errors.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "logsweep::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current_snapshot = telemetry.snapshot();
                    let events_delta = current_snapshot
                        .events_received
                        .saturating_sub(last_snapshot.events_received);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        events_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "logsweep::metrics",
                        throughput = format!("{throughput:.2}"),
                        api_calls = current_snapshot.api_calls,
                        events_received = current_snapshot.events_received,
                        fetch_errors = current_snapshot.fetch_errors,
                        completed_cycles = current_snapshot.completed_cycles,
                        "runtime metrics snapshot"
                    );

                    last_snapshot = current_snapshot;
                    last_tick = Instant::now();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn telemetry_records_counters() {
        let telemetry = Telemetry::default();
        telemetry.record_api_call();
        telemetry.record_api_call();
        telemetry.record_events_received(7);
        telemetry.record_events_received(0);
        telemetry.record_fetch_error();
        telemetry.record_completed_cycle();

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.api_calls, 2);
        assert_eq!(snapshot.events_received, 7);
        assert_eq!(snapshot.fetch_errors, 1);
        assert_eq!(snapshot.completed_cycles, 1);
    }

    #[tokio::test]
    async fn metrics_reporter_logs_until_shutdown() {
        let telemetry = Arc::new(Telemetry::default());
        telemetry.record_api_call();
        telemetry.record_events_received(10);

        let shutdown = CancellationToken::new();
        let handle =
            spawn_metrics_reporter(telemetry, shutdown.clone(), Duration::from_millis(10));

        shutdown.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should stop promptly")
            .expect("task should not panic");
    }
}
