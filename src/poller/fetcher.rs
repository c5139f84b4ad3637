//! Fetch-and-process execution for a single scan task: one paginated,
//! time-filtered query, rate-limited between page calls, with each page handed
//! to the downstream processor.

use crate::poller::status::{SourceStatus, SourceStatusMap};
use crate::poller::window::to_epoch_millis;
use crate::poller::worker::Task;
use crate::query::{LogPagination, LogQueryClient, QueryRequest};
use crate::runtime::config::PollerConfig;
use crate::runtime::processor::EventProcessor;
use crate::runtime::telemetry::Telemetry;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// How a scan task ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    /// Pagination was exhausted with no error.
    Completed,
    /// Cancellation was observed at a page boundary; the rest of the window
    /// is abandoned.
    Cancelled,
}

pub(crate) struct Fetcher<P> {
    client: Arc<dyn LogQueryClient>,
    processor: Arc<P>,
    telemetry: Arc<Telemetry>,
    status: Arc<SourceStatusMap>,
    region: String,
    api_sleep: Duration,
    stream_names: Vec<String>,
    stream_prefix: Option<String>,
}

impl<P: EventProcessor> Fetcher<P> {
    pub(crate) fn new(
        config: &PollerConfig,
        client: Arc<dyn LogQueryClient>,
        processor: Arc<P>,
        telemetry: Arc<Telemetry>,
        status: Arc<SourceStatusMap>,
    ) -> Self {
        Self {
            client,
            processor,
            telemetry,
            status,
            region: config.region().to_owned(),
            api_sleep: config.api_sleep(),
            stream_names: config.log_stream_names().to_vec(),
            stream_prefix: config.log_stream_name_prefix().map(str::to_owned),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Pages through the task's window and hands every page to the processor.
    ///
    /// Errors abort the task immediately; there is no retry of the failed
    /// window. Cancellation is checked at every page boundary and surfaces as
    /// [`FetchOutcome::Cancelled`], not as an error.
    pub(crate) async fn fetch(
        &self,
        shutdown: &CancellationToken,
        task: &Task,
    ) -> Result<FetchOutcome> {
        let mut pages = self.client.query(self.build_request(task));

        self.status.set(&task.source_id, SourceStatus::Polling);
        let outcome = self.drain_pages(shutdown, task, pages.as_mut()).await;
        self.status.clear(&task.source_id);

        outcome
    }

    async fn drain_pages(
        &self,
        shutdown: &CancellationToken,
        task: &Task,
        pages: &mut dyn LogPagination,
    ) -> Result<FetchOutcome> {
        while pages.has_more_pages() {
            if shutdown.is_cancelled() {
                tracing::debug!(
                    source = %task.source_id,
                    "cancellation observed at page boundary; abandoning window"
                );
                return Ok(FetchOutcome::Cancelled);
            }

            let page = tokio::select! {
                _ = shutdown.cancelled() => return Ok(FetchOutcome::Cancelled),
                page = pages.next_page() => page.with_context(|| {
                    format!(
                        "filtered event query failed for source '{}' in window [{}, {})",
                        task.source_id,
                        to_epoch_millis(task.window.start),
                        to_epoch_millis(task.window.end),
                    )
                })?,
            };

            self.telemetry.record_api_call();
            self.telemetry.record_events_received(page.events.len() as u64);

            // The quota is call-based, not content-based, so the pause applies
            // after every page including the last one.
            tracing::debug!(sleep = ?self.api_sleep, "pausing before the next page call");
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(FetchOutcome::Cancelled),
                _ = time::sleep(self.api_sleep) => {}
            }

            tracing::debug!(
                source = %task.source_id,
                events = page.events.len(),
                "processing fetched page"
            );
            self.status.set(&task.source_id, SourceStatus::Processing);
            self.processor
                .process_events(&page.events, &task.source_id, &self.region);
            self.status.set(&task.source_id, SourceStatus::Polling);
        }

        Ok(FetchOutcome::Completed)
    }

    fn build_request(&self, task: &Task) -> QueryRequest {
        let start_time_ms = to_epoch_millis(task.window.start);
        let end_time_ms = to_epoch_millis(task.window.end);
        tracing::debug!(
            source = %task.source_id,
            start_time_ms,
            end_time_ms,
            "constructing filtered event query"
        );

        QueryRequest {
            source_id: task.source_id.clone(),
            start_time_ms,
            end_time_ms,
            stream_names: self.stream_names.clone(),
            stream_prefix: self.stream_prefix.clone(),
        }
    }
}
