//! Worker pool lifecycle: launches the configured number of workers and joins
//! them during shutdown so no fetch task outlives the scheduler.

use crate::poller::fetcher::Fetcher;
use crate::poller::worker::{Worker, WorkRequestSender};
use crate::runtime::processor::EventProcessor;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns exactly `count` workers sharing the request channel, the
    /// shutdown token, and the fetcher.
    pub(crate) fn launch<P: EventProcessor>(
        count: usize,
        request_tx: WorkRequestSender,
        shutdown: CancellationToken,
        fetcher: Arc<Fetcher<P>>,
    ) -> Self {
        let mut workers = Vec::with_capacity(count);
        for worker_id in 0..count {
            let worker = Worker::new(
                worker_id,
                request_tx.clone(),
                shutdown.clone(),
                fetcher.clone(),
            );
            workers.push(tokio::spawn(worker.run()));
        }

        tracing::debug!(workers = count, "worker pool launched");
        Self { workers }
    }

    /// Waits for every worker to exit. Returns only once the pool is fully
    /// drained.
    pub(crate) async fn join(self) {
        let results = join_all(self.workers).await;
        for (worker_id, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                tracing::warn!(
                    worker = worker_id,
                    error = %err,
                    "worker task terminated unexpectedly"
                );
            }
        }
        tracing::debug!("worker pool drained");
    }
}
