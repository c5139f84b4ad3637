//! Shared fixtures for poller integration tests: a scripted query client, a
//! recording processor, and a deterministic clock.

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use logsweep::{EventProcessor, LogPage, LogPagination, LogQueryClient, QueryRequest, RawEvent, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// One scripted page response for a mock source.
#[derive(Debug, Clone)]
pub enum ScriptedPage {
    /// A page carrying this many events.
    Events(usize),
    /// A remote-call failure.
    Error(&'static str),
    /// A page that takes this long to arrive.
    Delayed(Duration, usize),
}

/// Scripted stand-in for the remote query API. Every query against a source
/// replays that source's page script from the beginning and is recorded for
/// later assertions.
#[derive(Default)]
pub struct MockLogClient {
    scripts: HashMap<String, Vec<ScriptedPage>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl MockLogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source_id: &str, pages: Vec<ScriptedPage>) -> Self {
        self.scripts.insert(source_id.to_owned(), pages);
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl LogQueryClient for MockLogClient {
    fn query(&self, request: QueryRequest) -> Box<dyn LogPagination> {
        let script = self
            .scripts
            .get(&request.source_id)
            .cloned()
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);
        Box::new(MockPagination {
            pages: script.into(),
        })
    }
}

struct MockPagination {
    pages: VecDeque<ScriptedPage>,
}

impl LogPagination for MockPagination {
    fn has_more_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    fn next_page(&mut self) -> BoxFuture<'_, Result<LogPage>> {
        let next = self.pages.pop_front();
        Box::pin(async move {
            match next {
                None => Err(anyhow!("next_page called after exhaustion")),
                Some(ScriptedPage::Events(count)) => Ok(page_of(count)),
                Some(ScriptedPage::Error(message)) => Err(anyhow!(message)),
                Some(ScriptedPage::Delayed(delay, count)) => {
                    tokio::time::sleep(delay).await;
                    Ok(page_of(count))
                }
            }
        })
    }
}

fn page_of(count: usize) -> LogPage {
    LogPage {
        events: (0..count)
            .map(|seq| RawEvent {
                message: format!("event {seq}"),
                ..RawEvent::default()
            })
            .collect(),
    }
}

/// One page delivery observed by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPage {
    pub source_id: String,
    pub region: String,
    pub events: usize,
}

#[derive(Default)]
pub struct RecordingProcessor {
    pages: Mutex<Vec<ProcessedPage>>,
}

impl RecordingProcessor {
    pub fn pages(&self) -> Vec<ProcessedPage> {
        self.pages.lock().unwrap().clone()
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }
}

impl EventProcessor for RecordingProcessor {
    fn process_events(&self, events: &[RawEvent], source_id: &str, region: &str) {
        self.pages.lock().unwrap().push(ProcessedPage {
            source_id: source_id.to_owned(),
            region: region.to_owned(),
            events: events.len(),
        });
    }
}

/// Deterministic clock yielding one sample per call; the final sample repeats
/// once the sequence is exhausted.
pub struct SequencedClock {
    samples: Vec<i64>,
    cursor: AtomicUsize,
}

impl SequencedClock {
    pub fn new(samples: Vec<i64>) -> Arc<Self> {
        assert!(!samples.is_empty(), "clock needs at least one sample");
        Arc::new(Self {
            samples,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn clock_fn(self: &Arc<Self>) -> impl Fn() -> Timestamp + Send {
        let clock = Arc::clone(self);
        move || {
            let index = clock
                .cursor
                .fetch_add(1, Ordering::SeqCst)
                .min(clock.samples.len() - 1);
            Timestamp::from_millis(clock.samples[index])
        }
    }
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    timeout(Duration::from_secs(5), async {
        loop {
            if condition() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}
