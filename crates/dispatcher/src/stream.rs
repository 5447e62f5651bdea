//! DataStream - the producer end of the sensor data channel
//!
//! Lives on the simulation side. Sending never blocks: a full queue drops
//! the item, since the next frame supersedes it.

use std::sync::Arc;

use bytes::Bytes;
use contracts::{EventSink, RawData, SensorEvent, SensorId};
use sensor_data::{serialize_event, serialize_gnss, GnssMeasurement};
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

use crate::metrics::QueueMetrics;

/// Encoded raw buffer plus the stream it belongs to
#[derive(Debug, Clone)]
pub struct SensorMessage {
    pub sensor_id: SensorId,
    pub buffer: Bytes,
}

pub struct DataStream {
    name: String,
    tx: mpsc::Sender<SensorMessage>,
    metrics: Arc<QueueMetrics>,
}

impl DataStream {
    /// Bounded stream and its consumer end
    pub fn channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<SensorMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let stream = Self {
            name: name.into(),
            tx,
            metrics: Arc::new(QueueMetrics::new()),
        };
        (stream, rx)
    }

    pub fn metrics(&self) -> &Arc<QueueMetrics> {
        &self.metrics
    }

    /// Queue a message; `false` when it was dropped
    pub fn send_message(&self, message: SensorMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics.record_write();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(m)) => {
                self.metrics.record_drop();
                observability::record_event_dropped(&self.name);
                warn!(stream = %self.name, sensor_id = %m.sensor_id, "stream full, data dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(m)) => {
                self.metrics.record_drop();
                observability::record_event_dropped(&self.name);
                error!(
                    stream = %self.name,
                    sensor_id = %m.sensor_id,
                    "stream closed, data dropped"
                );
                false
            }
        }
    }

    /// Forward a client-side GNSS reading
    pub fn send_gnss(&self, sensor_id: &SensorId, fix: &GnssMeasurement) -> bool {
        match serialize_gnss(fix) {
            Ok(raw) => self.send_message(SensorMessage {
                sensor_id: sensor_id.clone(),
                buffer: raw.encode(),
            }),
            Err(e) => {
                error!(
                    stream = %self.name,
                    sensor_id = %sensor_id,
                    error = %e,
                    "gnss encode failed"
                );
                false
            }
        }
    }
}

impl EventSink for DataStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, event: SensorEvent) {
        let sensor_id = event.sensor_id().clone();
        match serialize_event(&event) {
            Ok(raw) => {
                trace!(
                    stream = %self.name,
                    sensor_id = %sensor_id,
                    frame = raw.frame_number(),
                    "event queued"
                );
                self.send_message(SensorMessage {
                    sensor_id,
                    buffer: raw.encode(),
                });
            }
            Err(e) => {
                error!(
                    stream = %self.name,
                    sensor_id = %sensor_id,
                    error = %e,
                    "event encode failed"
                );
            }
        }
    }
}
