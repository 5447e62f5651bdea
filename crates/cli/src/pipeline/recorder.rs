//! Event sink that tallies what passes through it.

use std::sync::{Arc, Mutex};

use contracts::{EventSink, SensorEvent};
use observability::{DetectionAggregator, RunSummary};

/// Forwards every event to `inner` after updating the run aggregator
pub struct RecordingSink {
    inner: Arc<dyn EventSink>,
    aggregator: Mutex<DetectionAggregator>,
}

impl RecordingSink {
    pub fn new(inner: Arc<dyn EventSink>) -> Self {
        Self {
            inner,
            aggregator: Mutex::new(DetectionAggregator::new()),
        }
    }

    pub fn record_frame(&self) {
        self.aggregator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record_frame();
    }

    pub fn summary(&self) -> RunSummary {
        self.aggregator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .summary()
    }
}

impl EventSink for RecordingSink {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn send(&self, event: SensorEvent) {
        self.aggregator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .update(&event);
        self.inner.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ActorSnapshot, CollisionRecord, EventHeader, SensorId, Transform, Vector3,
    };

    struct CountingSink(Mutex<usize>);

    impl EventSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn send(&self, _event: SensorEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    fn collision(frame: u64) -> SensorEvent {
        SensorEvent::Collision(CollisionRecord {
            header: EventHeader {
                sensor_id: SensorId::new("collision"),
                frame,
                timestamp: 0.05 * frame as f64,
                sensor_transform: Transform::default(),
            },
            actor: ActorSnapshot::placeholder(1),
            other_actor: ActorSnapshot::placeholder(2),
            normal_impulse: Vector3::new(-1.0, 0.0, 0.0),
        })
    }

    #[test]
    fn forwards_and_counts() {
        let inner = Arc::new(CountingSink(Mutex::new(0)));
        let sink = RecordingSink::new(inner.clone());

        sink.record_frame();
        sink.send(collision(1));
        sink.record_frame();
        sink.send(collision(2));

        assert_eq!(*inner.0.lock().unwrap(), 2);
        assert_eq!(sink.name(), "counting");

        let summary = sink.summary();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.collisions, 2);
        assert_eq!(summary.detections, 0);
    }
}
