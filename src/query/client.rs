//! The abstraction over the remote paginated query API. Houses the
//! `LogQueryClient` and `LogPagination` traits consumed by workers, and the
//! error type transports surface through them.

use crate::query::types::{LogPage, QueryRequest};
use anyhow::Result;
use futures::future::BoxFuture;

/// Error classes a transport can surface through [`LogPagination::next_page`].
///
/// Transports wrap these in `anyhow::Error`; the worker downcasts to decide
/// whether a failed task was a shutdown artifact or a real remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// The transport aborted the request because its context was cancelled.
    Cancelled,
    /// The source rejected the call because the per-account call rate was
    /// exceeded.
    Throttled,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Cancelled => write!(f, "query request was cancelled by the transport"),
            QueryError::Throttled => write!(f, "source throttled the query call rate"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A client able to open paginated, time-filtered queries against remote log
/// sources. The wire format and transport behavior (timeouts, retries) are
/// owned by the implementation.
pub trait LogQueryClient: Send + Sync {
    fn query(&self, request: QueryRequest) -> Box<dyn LogPagination>;
}

/// Successive bounded pages of one query's results.
pub trait LogPagination: Send {
    /// Whether another page request would yield results. Does not perform a
    /// remote call.
    fn has_more_pages(&self) -> bool;

    /// Requests the next page from the source. Each invocation is one remote
    /// call and counts against the source's call-rate quota.
    fn next_page(&mut self) -> BoxFuture<'_, Result<LogPage>>;
}
