//! Dispatcher - decode and fan out to sinks

use std::sync::Arc;

use contracts::{RawBuffer, SinkConfig, SinkType};
use episode::WeakEpisodeProxy;
use sensor_data::deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sink::Reading;
use crate::sinks::{FileSink, LogSink};
use crate::stream::SensorMessage;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
    /// Episode the decoded readings resolve actors against
    pub episode: WeakEpisodeProxy,
}

pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<SensorMessage>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<SensorMessage>) -> Self {
        Self { config, input_rx }
    }

    /// Create every configured sink and start its worker
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(sink_count = self.config.sinks.len()))]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = self
            .config
            .sinks
            .iter()
            .map(create_sink_handle)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
            episode: self.config.episode,
        })
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(SinkHandle::spawn(
            LogSink::new(&config.name),
            config.queue_capacity,
        )),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Consumes the data stream and fans readings out to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<SensorMessage>,
    episode: WeakEpisodeProxy,
}

impl Dispatcher {
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<SensorMessage>,
        episode: WeakEpisodeProxy,
    ) -> Self {
        Self {
            handles,
            input_rx,
            episode,
        }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run until the input stream closes, then drain every sink
    ///
    /// Returns final per-sink metrics.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut received: u64 = 0;
        while let Some(message) = self.input_rx.recv().await {
            received += 1;
            if let Some(reading) = self.decode(message) {
                self.dispatch(reading);
            }
            if received.is_multiple_of(100) {
                debug!(messages = received, "Dispatcher progress");
            }
        }

        info!(messages = received, "Dispatcher input closed, shutting down");

        let mut metrics = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let snapshot = Arc::clone(handle.metrics());
            handle.shutdown().await;
            metrics.push((name, snapshot.snapshot()));
        }

        info!("Dispatcher shutdown complete");
        metrics
    }

    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    fn decode(&self, message: SensorMessage) -> Option<Reading> {
        let raw = match RawBuffer::decode(message.buffer) {
            Ok(raw) => raw,
            Err(e) => {
                observability::record_decode_failure(None);
                warn!(sensor_id = %message.sensor_id, error = %e, "Malformed raw buffer");
                return None;
            }
        };
        let sensor_type = raw.sensor_type();
        match deserialize(raw, self.episode.clone()) {
            Ok(measurement) => Some(Reading {
                sensor_id: message.sensor_id,
                measurement: Arc::new(measurement),
            }),
            Err(e) => {
                observability::record_decode_failure(Some(sensor_type));
                warn!(sensor_id = %message.sensor_id, error = %e, "Undecodable payload");
                None
            }
        }
    }

    fn dispatch(&self, reading: Reading) {
        for handle in &self.handles {
            handle.try_send(reading.clone());
        }
    }
}

/// Build a dispatcher from sink configs
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    episode: WeakEpisodeProxy,
    input_rx: mpsc::Receiver<SensorMessage>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
        episode,
    };
    DispatcherBuilder::new(config, input_rx).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::DataStream;
    use bytes::Bytes;
    use contracts::{
        ActorSnapshot, Centimeters, EngineHandle, EventHeader, EventSink, HitResult, Location,
        ObstacleEvent, SensorEvent, SensorId, Transform, Vector3,
    };
    use episode::Episode;
    use std::collections::HashMap;

    fn obstacle_event(frame: u64, other: ActorSnapshot) -> SensorEvent {
        SensorEvent::Obstacle(ObstacleEvent {
            header: EventHeader {
                sensor_id: SensorId::new("front"),
                frame,
                timestamp: 0.05 * frame as f64,
                sensor_transform: Transform::default(),
            },
            actor: ActorSnapshot::placeholder(1),
            other_actor: Some(other),
            distance: Centimeters(250.0),
            hit_radius: Centimeters(10.0),
            hit: HitResult {
                handle: Some(EngineHandle(2)),
                distance: Centimeters(250.0),
                location: Location::new(250.0, 0.0, 0.0),
                normal: Vector3::new(-1.0, 0.0, 0.0),
            },
        })
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let episode = Episode::start(1, "Town01", None);
        let (stream, rx) = DataStream::channel("main", 16);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];
        let join = Dispatcher::with_handles(handles, rx, episode.downgrade()).spawn();

        for frame in 0..5 {
            stream.send(obstacle_event(frame, ActorSnapshot::placeholder(2)));
        }
        drop(stream);

        let metrics = join.await.unwrap();
        assert_eq!(metrics.len(), 2);
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.failure_count, 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_buffer_skipped() {
        let episode = Episode::start(1, "Town01", None);
        let (tx, rx) = mpsc::channel(4);
        let handles = vec![SinkHandle::spawn(LogSink::new("log"), 4)];
        let join = Dispatcher::with_handles(handles, rx, episode.downgrade()).spawn();

        tx.send(SensorMessage {
            sensor_id: SensorId::new("front"),
            buffer: Bytes::from_static(&[0u8; 8]),
        })
        .await
        .unwrap();
        drop(tx);

        let metrics = join.await.unwrap();
        assert_eq!(metrics[0].1.write_count, 0);
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let episode = Episode::start(1, "Town01", None);
        let (stream, rx) = DataStream::channel("main", 4);

        let configs = vec![SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let join = create_dispatcher(configs, episode.downgrade(), rx)
            .unwrap()
            .spawn();
        stream.send(obstacle_event(1, ActorSnapshot::placeholder(2)));
        drop(stream);

        let metrics = join.await.unwrap();
        assert_eq!(metrics[0].0, "test_log");
        assert_eq!(metrics[0].1.write_count, 1);
    }

    #[test]
    fn test_file_sink_on_a_file_path_fails() {
        let episode = Episode::start(1, "Town01", None);
        let (_stream, rx) = DataStream::channel("main", 4);
        let occupied = tempfile::NamedTempFile::new().unwrap();

        let configs = vec![SinkConfig {
            name: "disk".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 4,
            params: HashMap::from([(
                "base_path".to_string(),
                occupied.path().display().to_string(),
            )]),
        }];

        let err = create_dispatcher(configs, episode.downgrade(), rx).err().unwrap();
        assert!(matches!(err, DispatcherError::SinkCreation { ref name, .. } if name == "disk"));
    }
}
