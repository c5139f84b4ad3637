//! The scan-cycle scheduler. Owns the sliding time window, distributes one
//! task per source per cycle to whichever worker is ready, and guarantees the
//! worker pool is fully drained before `run` returns.

use crate::poller::fetcher::Fetcher;
use crate::poller::status::SourceStatusMap;
use crate::poller::window::{TimeWindow, Timestamp};
use crate::poller::worker::{work_request_channel, Task, WorkRequestReceiver};
use crate::poller::worker_pool::WorkerPool;
use crate::query::LogQueryClient;
use crate::runtime::config::PollerConfig;
use crate::runtime::processor::EventProcessor;
use crate::runtime::telemetry::{spawn_metrics_reporter, Telemetry};
use std::sync::Arc;
use tokio::time;
use tokio_util::sync::CancellationToken;

pub struct Scheduler<P> {
    config: PollerConfig,
    client: Arc<dyn LogQueryClient>,
    processor: Arc<P>,
    telemetry: Arc<Telemetry>,
    status: Arc<SourceStatusMap>,
}

impl<P: EventProcessor> Scheduler<P> {
    pub fn new(config: PollerConfig, client: Arc<dyn LogQueryClient>, processor: P) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "PollerConfig should have been validated at construction time"
        );
        Self {
            config,
            client,
            processor: Arc::new(processor),
            telemetry: Arc::new(Telemetry::default()),
            status: Arc::new(SourceStatusMap::new()),
        }
    }

    /// Returns a reference to the scheduler's configuration.
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Returns a clone of the telemetry handle for observability.
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Returns a reference to the processor instance.
    pub fn processor(&self) -> Arc<P> {
        self.processor.clone()
    }

    /// Read-only view of per-source worker activity.
    pub fn status(&self) -> Arc<SourceStatusMap> {
        self.status.clone()
    }

    /// Runs scan cycles until `shutdown` fires.
    ///
    /// Each cycle offers every source in `source_ids`, in order, to the first
    /// ready worker, then sleeps for the scan frequency and slides the window
    /// forward. The supplied clock exists so window arithmetic is
    /// deterministic under test; live callers pass [`Timestamp::now`].
    ///
    /// Returns only after every worker has exited. In-flight tasks are not
    /// aborted here; workers observe the cancellation themselves.
    pub async fn run<F>(&self, shutdown: CancellationToken, source_ids: &[String], clock: F)
    where
        F: Fn() -> Timestamp + Send,
    {
        tracing::info!(
            sources = source_ids.len(),
            workers = self.config.number_of_workers(),
            region = self.config.region(),
            "starting poller"
        );

        let fetcher = Arc::new(Fetcher::new(
            &self.config,
            self.client.clone(),
            self.processor.clone(),
            self.telemetry.clone(),
            self.status.clone(),
        ));

        let reporter_token = shutdown.child_token();
        let reporter = spawn_metrics_reporter(
            self.telemetry.clone(),
            reporter_token.clone(),
            self.config.metrics_interval(),
        );

        let (request_tx, request_rx) = work_request_channel(self.config.number_of_workers());
        let pool = WorkerPool::launch(
            self.config.number_of_workers(),
            request_tx,
            shutdown.clone(),
            fetcher,
        );

        self.distribute(&shutdown, request_rx, source_ids, clock)
            .await;

        // Dropping the receiver wakes any worker still parked on a request
        // send or an unanswered slot, then the pool drains.
        pool.join().await;

        reporter_token.cancel();
        if let Err(err) = reporter.await {
            tracing::warn!(error = %err, "metrics reporter task panicked");
        }

        tracing::info!("poller stopped");
    }

    async fn distribute<F>(
        &self,
        shutdown: &CancellationToken,
        mut request_rx: WorkRequestReceiver,
        source_ids: &[String],
        clock: F,
    ) where
        F: Fn() -> Timestamp,
    {
        let latency = self.config.latency();
        let scan_frequency = self.config.scan_frequency();
        let mut window = TimeWindow::initial(
            clock(),
            latency,
            scan_frequency,
            self.config.start_position(),
        );

        while !shutdown.is_cancelled() {
            for source_id in source_ids {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("cancellation observed while waiting for a ready worker");
                        return;
                    }
                    slot = request_rx.recv() => {
                        let Some(slot) = slot else {
                            tracing::warn!("all workers exited; stopping task distribution");
                            return;
                        };
                        let task = Task {
                            source_id: source_id.clone(),
                            window,
                        };
                        if slot.send(task).is_err() {
                            // The paired worker died between requesting and
                            // receiving; the source is picked up again next cycle.
                            tracing::warn!(
                                source = %source_id,
                                "worker abandoned its task slot"
                            );
                        }
                    }
                }
            }
            self.telemetry.record_completed_cycle();

            tracing::debug!(sleep = ?scan_frequency, "sleeping before the next scan cycle");
            tokio::select! {
                _ = time::sleep(scan_frequency) => {}
                _ = shutdown.cancelled() => {}
            }

            window.advance(clock(), latency);
        }
    }
}
