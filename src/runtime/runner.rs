use crate::poller::scheduler::Scheduler;
use crate::poller::window::Timestamp;
use crate::query::LogQueryClient;
use crate::runtime::config::PollerConfig;
use crate::runtime::processor::EventProcessor;
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Coordinates the poller lifecycle and handles OS signals for graceful shutdowns.
pub struct Runner<P> {
    scheduler: Scheduler<P>,
    shutdown: CancellationToken,
}

impl<P: EventProcessor> Runner<P> {
    /// Creates a new runner and wires a root [`CancellationToken`] that
    /// propagates through the scheduler, the worker pool, and every in-flight
    /// fetch.
    pub fn new(config: PollerConfig, client: Arc<dyn LogQueryClient>, processor: P) -> Self {
        Self {
            scheduler: Scheduler::new(config, client, processor),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns a reference to the underlying scheduler, e.g. for telemetry.
    pub fn scheduler(&self) -> &Scheduler<P> {
        &self.scheduler
    }

    /// Runs until a Ctrl-C (SIGINT) is received or the shutdown token is
    /// cancelled elsewhere, then waits for the worker pool to drain.
    pub async fn run_until_ctrl_c(&self, source_ids: &[String]) -> Result<()> {
        tracing::info!("runner started; waiting for Ctrl-C (SIGINT) to initiate shutdown");

        let run = self
            .scheduler
            .run(self.shutdown.clone(), source_ids, Timestamp::now);
        tokio::pin!(run);

        tokio::select! {
            _ = &mut run => {
                tracing::info!("runner shutdown token cancelled");
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Ctrl-C received; shutting down runner");
                self.shutdown.cancel();
                run.await;
            }
        }

        Ok(())
    }
}
