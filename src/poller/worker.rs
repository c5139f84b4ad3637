//! The per-worker request/fetch loop and the handshake types shared with the
//! scheduler.
//!
//! A worker asks for work by sending a reply slot over the request channel and
//! then waits on that slot for its task. The scheduler creates a task only
//! after consuming a request, so the pairing is always 1:1: a request is never
//! answered twice and an offer is never made without a requester synchronized
//! to receive it. A slot dropped unanswered means the scheduler shut down
//! first, which the worker treats as cancellation.

use crate::poller::fetcher::{FetchOutcome, Fetcher};
use crate::poller::window::{to_epoch_millis, TimeWindow};
use crate::query::QueryError;
use crate::runtime::processor::EventProcessor;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// One scan assignment: a source and the window to cover. Created fresh by the
/// scheduler each cycle and owned by exactly one worker until the fetch ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub source_id: String,
    pub window: TimeWindow,
}

/// Reply slot the scheduler answers a work request through.
pub(crate) type TaskSlot = oneshot::Sender<Task>;
pub(crate) type WorkRequestSender = mpsc::Sender<TaskSlot>;
pub(crate) type WorkRequestReceiver = mpsc::Receiver<TaskSlot>;

pub(crate) fn work_request_channel(capacity: usize) -> (WorkRequestSender, WorkRequestReceiver) {
    mpsc::channel(capacity)
}

pub(crate) struct Worker<P> {
    id: usize,
    request_tx: WorkRequestSender,
    shutdown: CancellationToken,
    fetcher: Arc<Fetcher<P>>,
}

impl<P: EventProcessor> Worker<P> {
    pub(crate) fn new(
        id: usize,
        request_tx: WorkRequestSender,
        shutdown: CancellationToken,
        fetcher: Arc<Fetcher<P>>,
    ) -> Self {
        Self {
            id,
            request_tx,
            shutdown,
            fetcher,
        }
    }

    #[tracing::instrument(name = "worker", skip_all, fields(worker = self.id))]
    pub(crate) async fn run(self) {
        tracing::debug!("worker task started");

        loop {
            let (slot, pending_task) = oneshot::channel();

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::debug!("shutdown requested; exiting worker loop");
                    break;
                }
                sent = self.request_tx.send(slot) => {
                    if sent.is_err() {
                        tracing::debug!("request channel closed; exiting worker loop");
                        break;
                    }
                }
            }

            // An accepted request must be answered before anything else
            // happens. The scheduler replies to every request it consumes and
            // drops unanswered slots only while shutting down.
            let task = match pending_task.await {
                Ok(task) => task,
                Err(_) => {
                    tracing::debug!("task slot dropped during shutdown; exiting worker loop");
                    break;
                }
            };

            self.execute(task).await;
        }

        tracing::debug!("worker task exited");
    }

    async fn execute(&self, task: Task) {
        tracing::info!(source = %task.source_id, "worker for source has started");

        match self.fetcher.fetch(&self.shutdown, &task).await {
            Ok(FetchOutcome::Completed) => {}
            Ok(FetchOutcome::Cancelled) => {
                tracing::debug!(source = %task.source_id, "scan task cancelled during shutdown");
            }
            Err(err) => {
                self.fetcher.telemetry().record_fetch_error();
                if let Some(QueryError::Cancelled) = err.downcast_ref::<QueryError>() {
                    tracing::error!(
                        source = %task.source_id,
                        error = %err,
                        "event fetch failed with a transport cancellation"
                    );
                }
                tracing::error!(
                    source = %task.source_id,
                    window_start = to_epoch_millis(task.window.start),
                    window_end = to_epoch_millis(task.window.end),
                    error = %err,
                    "event fetch failed"
                );
            }
        }

        tracing::info!(source = %task.source_id, "worker for source has stopped");
    }
}
