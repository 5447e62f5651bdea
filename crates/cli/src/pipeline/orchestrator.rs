//! Pipeline orchestrator - wires the simulation to the dispatcher.
//!
//! Host-side events flow `Simulation -> RecordingSink -> DataStream`; GNSS
//! fixes are bridged from their listen callback into the same stream. The
//! dispatcher decodes each message and fans it out to the configured sinks.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{EventSink, ScenarioBlueprint};
use dispatcher::DataStream;
use sensor_data::SensorMeasurement;
use sim_world::Simulation;
use tracing::{debug, info, warn};

use super::{PipelineStats, RecordingSink};
use crate::error::{CliError, Result};

const STREAM_NAME: &str = "sensor_stream";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated scenario
    pub blueprint: ScenarioBlueprint,

    /// Frames to simulate
    pub frames: u64,

    pub episode_id: u64,

    /// Sleep one fixed step between frames
    pub realtime: bool,

    /// Sensor stream capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run to completion or until `shutdown` resolves, then drain the sinks
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (stream, stream_rx) = DataStream::channel(STREAM_NAME, self.config.buffer_size);
        let stream = Arc::new(stream);
        let recorder = Arc::new(RecordingSink::new(Arc::clone(&stream) as Arc<dyn EventSink>));

        let mut simulation = Simulation::from_blueprint(
            blueprint,
            self.config.episode_id,
            Arc::clone(&recorder) as Arc<dyn EventSink>,
        )?;

        for gnss in simulation.gnss_sensors() {
            let stream = Arc::clone(&stream);
            let sensor_id = gnss.sensor_id().clone();
            gnss.listen(Arc::new(move |reading: Arc<SensorMeasurement>| {
                if let Some(fix) = reading.as_gnss() {
                    stream.send_gnss(&sensor_id, fix);
                }
            }));
        }

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - readings will be dropped");
        }

        let dispatcher = dispatcher::create_dispatcher(
            blueprint.sinks.clone(),
            simulation.episode().downgrade(),
            stream_rx,
        )?;
        let dispatcher_handle = dispatcher.spawn();

        info!(
            frames = self.config.frames,
            sinks = blueprint.sinks.len(),
            realtime = self.config.realtime,
            "Pipeline running"
        );

        let pacing = self
            .config
            .realtime
            .then(|| Duration::from_secs_f64(simulation.fixed_delta_seconds()));

        let interrupted = tokio::select! {
            result = drive(&mut simulation, &recorder, self.config.frames, pacing) => {
                result?;
                false
            }
            _ = shutdown => {
                warn!("Received shutdown signal, stopping simulation");
                true
            }
        };

        for gnss in simulation.gnss_sensors() {
            gnss.stop();
        }

        let frames_simulated = simulation.episode().timestamp().frame;
        let collisions_recorded = simulation.episode().collision_count();
        let registered_actors = simulation.episode().actors().len();
        simulation.end();
        drop(simulation);

        let stream_metrics = stream.metrics().snapshot();
        let detections = recorder.summary();
        // Last senders; the dispatcher sees end of input once both are gone
        drop(recorder);
        drop(stream);

        let sink_metrics = match tokio::time::timeout(DRAIN_TIMEOUT, dispatcher_handle).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => return Err(CliError::shutdown(format!("dispatcher task failed: {e}"))),
            Err(_) => {
                return Err(CliError::shutdown(format!(
                    "dispatcher did not drain within {}s",
                    DRAIN_TIMEOUT.as_secs()
                )))
            }
        };

        let stats = PipelineStats {
            frames_simulated,
            interrupted,
            duration: start_time.elapsed(),
            registered_actors,
            collisions_recorded,
            detections,
            stream: stream_metrics,
            sinks: sink_metrics,
        };

        info!(
            frames = stats.frames_simulated,
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Step the simulation `frames` times
async fn drive(
    simulation: &mut Simulation,
    recorder: &RecordingSink,
    frames: u64,
    pacing: Option<Duration>,
) -> Result<()> {
    let mut ticker = pacing.map(tokio::time::interval);

    for _ in 0..frames {
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            // Let the dispatcher keep up with the stream
            None => tokio::task::yield_now().await,
        }

        let report = simulation.tick()?;
        recorder.record_frame();

        for trace in &report.debug_traces {
            debug!(
                tag = %trace.tag,
                start = ?trace.start,
                end = ?trace.end,
                hit = ?trace.hit,
                "Debug line trace"
            );
        }
        if report.events() > 0 {
            debug!(
                frame = report.frame,
                obstacles = report.obstacle_events,
                collisions = report.collision_events,
                "Frame produced events"
            );
        }
    }

    Ok(())
}
