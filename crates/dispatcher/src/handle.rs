//! SinkHandle - one sink, its bounded queue and its worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::QueueMetrics;
use crate::sink::{DataSink, Reading};

pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Reading>,
    metrics: Arc<QueueMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task for `sink`
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(QueueMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<QueueMetrics> {
        &self.metrics
    }

    /// Queue a reading without waiting; `false` if it was dropped
    pub fn try_send(&self, reading: Reading) -> bool {
        match self.tx.try_send(reading) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.metrics.record_drop();
                warn!(
                    sink = %self.name,
                    sensor_id = %r.sensor_id,
                    "Queue full, reading dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_drop();
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Close the queue and wait for the worker to drain it
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Reading>,
    metrics: Arc<QueueMetrics>,
    name: String,
) {
    debug!("Sink worker started");

    while let Some(reading) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&reading).await {
            Ok(()) => {
                metrics.record_write();
                observability::record_reading_dispatched(&name, true);
            }
            Err(e) => {
                // A single failed write never stops the worker
                metrics.record_failure();
                observability::record_reading_dispatched(&name, false);
                error!(sensor_id = %reading.sensor_id, error = %e, "Write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
    }

    debug!("Sink worker stopped");
}
