//! EventSink trait - sensor output interface
//!
//! Push-only from the producer's perspective: no acknowledgement channel.

use crate::SensorEvent;

/// Fire-and-forget event sink
///
/// Implementations must not block; an event that cannot be delivered is
/// dropped (the next frame's detection supersedes it).
pub trait EventSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Push one event
    fn send(&self, event: SensorEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn send(&self, _event: SensorEvent) {}
}
