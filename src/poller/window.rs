//! Scan-window bookkeeping: timestamps with an explicit "beginning of time"
//! sentinel and the sliding `[start, end)` interval owned by the scheduler.

use crate::runtime::config::StartPosition;
use std::ops::Sub;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in source time, in milliseconds since the Unix epoch.
///
/// The unset value stands for "beginning of time" and is carried
/// structurally rather than as a derived negative epoch number, so it can
/// never be produced by clock arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(Option<i64>);

impl Timestamp {
    /// The "unset / beginning of time" sentinel.
    pub const UNSET: Timestamp = Timestamp(None);

    pub fn from_millis(millis: i64) -> Self {
        Timestamp(Some(millis))
    }

    /// The current wall-clock time. Live pollers pass this as the scheduler's
    /// clock; tests substitute a deterministic callback.
    pub fn now() -> Self {
        let millis = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            Err(before_epoch) => -(before_epoch.duration().as_millis() as i64),
        };
        Timestamp(Some(millis))
    }

    pub fn is_unset(self) -> bool {
        self.0.is_none()
    }

    pub fn millis(self) -> Option<i64> {
        self.0
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    /// Shifts a set timestamp backwards. The unset sentinel passes through
    /// unchanged: it already means "beginning of time".
    fn sub(self, offset: Duration) -> Timestamp {
        Timestamp(
            self.0
                .map(|millis| millis.saturating_sub(offset.as_millis() as i64)),
        )
    }
}

/// Converts a timestamp to the epoch-millisecond value used in remote query
/// filters. The unset sentinel maps to the reserved value `0` so a query with
/// no lower bound never carries a nonsensical negative number.
pub fn to_epoch_millis(ts: Timestamp) -> i64 {
    ts.millis().unwrap_or(0)
}

/// The `[start, end)` interval of source time covered by one scan cycle.
///
/// Mutated only by the scheduler, once per cycle: `end` is always
/// `clock() - latency` at the cycle boundary, and the next cycle's `start`
/// is this cycle's `end`, so consecutive windows are contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    pub(crate) fn initial(
        now: Timestamp,
        latency: Duration,
        scan_frequency: Duration,
        start_position: StartPosition,
    ) -> Self {
        let end = now - latency;
        let start = match start_position {
            StartPosition::End => end - scan_frequency,
            StartPosition::Beginning => Timestamp::UNSET,
        };
        TimeWindow { start, end }
    }

    pub(crate) fn advance(&mut self, now: Timestamp, latency: Duration) {
        self.start = self.end;
        self.end = now - latency;
    }
}
