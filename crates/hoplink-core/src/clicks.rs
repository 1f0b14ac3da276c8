use crate::shortcode::ShortCode;

/// The event-dispatch port for click recording.
///
/// Dispatch is fire-and-forget with an at-least-once contract: the call
/// never blocks and never fails the caller. Implementations log delivery
/// failures and drop the event; duplicate deliveries are accepted and
/// only inflate the derived click totals.
pub trait ClickQueue: Send + Sync + 'static {
    /// Enqueues a click event for the given short code.
    fn enqueue(&self, code: &ShortCode);
}

/// A queue that discards every event.
///
/// Used by deployments without analytics and as a stand-in in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQueue;

impl ClickQueue for NullQueue {
    fn enqueue(&self, _code: &ShortCode) {}
}
