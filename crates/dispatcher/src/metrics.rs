//! Counters for a bounded queue: the sensor stream or a sink's work queue
//!
//! The producer side records writes and drops, the consumer side records
//! failures and the current depth.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct QueueMetrics {
    depth: AtomicUsize,
    accepted: AtomicU64,
    failed: AtomicU64,
    /// Rejected because the queue was full or closed
    dropped: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_queue_len(&self, len: usize) {
        self.depth.store(len, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.depth.load(Ordering::Relaxed),
            write_count: self.accepted.load(Ordering::Relaxed),
            failure_count: self.failed.load(Ordering::Relaxed),
            dropped_count: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Items offered to the queue, accepted or not
    pub fn offered(&self) -> u64 {
        self.write_count + self.dropped_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = QueueMetrics::new();
        metrics.record_write();
        metrics.record_write();
        metrics.record_drop();
        metrics.record_failure();
        metrics.set_queue_len(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_count, 2);
        assert_eq!(snapshot.dropped_count, 1);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.queue_len, 3);
        assert_eq!(snapshot.offered(), 3);
    }
}
