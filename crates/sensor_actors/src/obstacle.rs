//! Obstacle detection probe
//!
//! Each frame the probe sweeps a sphere forward from its pose and reports
//! the nearest blocking hit. One event per frame at most.

use contracts::{
    EngineHandle, EventHeader, EventSink, HitResult, ObstacleEvent, SensorEvent, SensorId,
    SweepFilter, SweepRequest, Transform, WorldQuery,
};
use episode::{EpisodeProxy, WeakEpisodeProxy};
use tracing::{debug, trace};

use crate::attributes::ObstacleDetectorConfig;
use crate::lifecycle::{bind, SensorState};

/// Tag under which debug sweeps are recorded
pub const DEBUG_TRACE_TAG: &str = "ObstacleDebugTrace";

/// Sweep described by a probe at `pose`, in engine units
pub fn sweep_request(
    pose: &Transform,
    config: &ObstacleDetectorConfig,
    self_handle: EngineHandle,
    owner: Option<EngineHandle>,
) -> SweepRequest {
    let distance = config.distance.to_centimeters();
    let start = pose.location;
    let end = start + pose.forward_vector() * distance.value();

    let mut ignored = vec![self_handle];
    ignored.extend(owner);

    SweepRequest {
        start,
        end,
        radius: config.hit_radius.to_centimeters(),
        filter: if config.only_dynamics {
            SweepFilter::AllDynamicObjects
        } else {
            SweepFilter::WorldStatic
        },
        ignored,
        debug_tag: config.debug_linetrace.then(|| DEBUG_TRACE_TAG.to_string()),
    }
}

/// Nearest blocking hit in front of the probe
///
/// Never reports the probe itself or its owner.
pub fn detect(
    pose: &Transform,
    config: &ObstacleDetectorConfig,
    self_handle: EngineHandle,
    owner: Option<EngineHandle>,
    world: &impl WorldQuery,
) -> Option<HitResult> {
    let request = sweep_request(pose, config, self_handle, owner);
    world
        .sweep_single(&request)
        .filter(|hit| hit.handle.map_or(true, |h| !request.is_ignored(h)))
}

/// Host-side obstacle detector
#[derive(Debug)]
pub struct ObstacleDetectionSensor {
    sensor_id: SensorId,
    handle: EngineHandle,
    owner: Option<EngineHandle>,
    config: ObstacleDetectorConfig,
    state: SensorState,
    episode: WeakEpisodeProxy,
}

impl ObstacleDetectionSensor {
    pub fn new(
        sensor_id: impl Into<SensorId>,
        handle: EngineHandle,
        owner: Option<EngineHandle>,
        config: ObstacleDetectorConfig,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            handle,
            owner,
            config,
            state: SensorState::Unbound,
            episode: WeakEpisodeProxy::default(),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle
    }

    pub fn owner(&self) -> Option<EngineHandle> {
        self.owner
    }

    pub fn config(&self) -> &ObstacleDetectorConfig {
        &self.config
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Bind to the hosting episode; `None` disables the probe for good
    pub fn begin_play(&mut self, episode: Option<&EpisodeProxy>) {
        if self.state == SensorState::Disabled {
            return;
        }
        let (state, episode) = bind(&self.sensor_id, "obstacle", episode);
        self.state = state;
        self.episode = episode;
    }

    /// Run one detection at `pose` and push the event, if any, to `sink`
    pub fn tick(
        &self,
        pose: &Transform,
        world: &impl WorldQuery,
        sink: &dyn EventSink,
    ) -> Option<ObstacleEvent> {
        if self.state != SensorState::Active {
            return None;
        }
        let Some(episode) = self.episode.try_lock() else {
            trace!(sensor_id = %self.sensor_id, "episode gone, skipping tick");
            return None;
        };

        let hit = detect(pose, &self.config, self.handle, self.owner, world)?;
        let timestamp = episode.timestamp();
        let actors = episode.actors();

        let event = ObstacleEvent {
            header: EventHeader {
                sensor_id: self.sensor_id.clone(),
                frame: timestamp.frame,
                timestamp: timestamp.elapsed_seconds,
                sensor_transform: *pose,
            },
            actor: actors.find_or_fake(self.handle),
            other_actor: hit.handle.map(|h| actors.find_or_fake(h)),
            distance: hit.distance,
            hit_radius: self.config.hit_radius.to_centimeters(),
            hit,
        };

        debug!(
            sensor_id = %self.sensor_id,
            frame = timestamp.frame,
            distance = %hit.distance,
            other_actor = ?event.other_actor.as_ref().map(|a| a.id),
            "obstacle detected"
        );
        sink.send(SensorEvent::Obstacle(event.clone()));
        Some(event)
    }
}
