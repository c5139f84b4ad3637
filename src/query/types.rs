//! Request and response types exchanged with the remote query API.

/// One raw event as returned by the remote source, before any downstream
/// transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    /// Opaque identifier assigned by the source, when the source provides one.
    pub event_id: Option<String>,
    /// Name of the stream the event was written to within its source.
    pub stream: Option<String>,
    /// Source-side event timestamp in epoch milliseconds.
    pub timestamp: Option<i64>,
    /// When the source ingested the event, in epoch milliseconds.
    pub ingested_at: Option<i64>,
    pub message: String,
}

/// One page of query results. Whether more pages remain is reported by the
/// paginator, not the page itself.
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub events: Vec<RawEvent>,
}

/// A time-filtered query against a single source.
///
/// `start_time_ms` uses the reserved value `0` to mean "no lower bound"; see
/// [`crate::poller::window::to_epoch_millis`]. The interval is half-open:
/// `[start_time_ms, end_time_ms)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub source_id: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    /// Restrict the query to these stream names. Empty means no restriction.
    /// May be combined with `stream_prefix`.
    pub stream_names: Vec<String>,
    /// Restrict the query to streams whose name starts with this prefix.
    pub stream_prefix: Option<String>,
}
