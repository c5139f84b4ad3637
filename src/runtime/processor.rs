use crate::query::RawEvent;

/// Trait implemented by downstream consumers of fetched event pages.
///
/// Called once per page, from whichever worker fetched it. Implementations
/// transform the raw events into structured records and emit them; the poller
/// itself never inspects event contents. Delivery is at-least-once across
/// restarts of the scan cycle, so deduplication belongs to the implementer.
pub trait EventProcessor: Send + Sync + 'static {
    fn process_events(&self, events: &[RawEvent], source_id: &str, region: &str);
}
