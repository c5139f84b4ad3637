use std::collections::HashMap;
use std::sync::Mutex;

/// What a worker is currently doing with a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// A worker is paging through the source's filtered events.
    Polling,
    /// The most recent page is being handed to the processor.
    Processing,
}

/// Concurrent-safe snapshot of per-source activity, keyed by source id.
///
/// Purely an observability hook: workers update it around the fetch loop and
/// readers take point-in-time snapshots. It never gates or orders task
/// distribution.
#[derive(Debug, Default)]
pub struct SourceStatusMap {
    inner: Mutex<HashMap<String, SourceStatus>>,
}

impl SourceStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self, source_id: &str, status: SourceStatus) {
        let mut inner = self.inner.lock().expect("status map poisoned");
        inner.insert(source_id.to_owned(), status);
    }

    pub(crate) fn clear(&self, source_id: &str) {
        let mut inner = self.inner.lock().expect("status map poisoned");
        inner.remove(source_id);
    }

    /// Current status of one source, if any worker is on it.
    pub fn get(&self, source_id: &str) -> Option<SourceStatus> {
        let inner = self.inner.lock().expect("status map poisoned");
        inner.get(source_id).copied()
    }

    /// Point-in-time copy of every active source's status.
    pub fn snapshot(&self) -> HashMap<String, SourceStatus> {
        let inner = self.inner.lock().expect("status map poisoned");
        inner.clone()
    }
}
