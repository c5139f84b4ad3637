pub mod poller;
pub mod query;
pub mod runtime;

pub use poller::scheduler::Scheduler;
pub use poller::status::{SourceStatus, SourceStatusMap};
pub use poller::window::{to_epoch_millis, TimeWindow, Timestamp};
pub use poller::worker::Task;
pub use query::{LogPage, LogPagination, LogQueryClient, QueryError, QueryRequest, RawEvent};
pub use runtime::config::{PollerConfig, PollerConfigBuilder, StartPosition};
pub use runtime::processor::EventProcessor;
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
