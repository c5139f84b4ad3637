//! Remote query plumbing: the client and pagination traits workers consume,
//! plus the request/response types they exchange.

pub mod client;
pub mod types;

pub use client::{LogPagination, LogQueryClient, QueryError};
pub use types::{LogPage, QueryRequest, RawEvent};
