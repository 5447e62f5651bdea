//! Collision sensor
//!
//! Attached to a parent actor; the host calls [`CollisionSensor::on_collision`]
//! whenever the parent's physics body reports a contact.

use contracts::{
    CollisionRecord, EngineHandle, EventHeader, EventSink, SensorEvent, SensorId, Transform,
    Vector3,
};
use episode::{EpisodeProxy, WeakEpisodeProxy};
use tracing::{debug, trace};

use crate::lifecycle::{bind, SensorState};

#[derive(Debug)]
pub struct CollisionSensor {
    sensor_id: SensorId,
    parent: EngineHandle,
    state: SensorState,
    episode: WeakEpisodeProxy,
}

impl CollisionSensor {
    pub fn new(sensor_id: impl Into<SensorId>, parent: EngineHandle) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            parent,
            state: SensorState::Unbound,
            episode: WeakEpisodeProxy::default(),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn parent(&self) -> EngineHandle {
        self.parent
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn begin_play(&mut self, episode: Option<&EpisodeProxy>) {
        if self.state == SensorState::Disabled {
            return;
        }
        let (state, episode) = bind(&self.sensor_id, "collision", episode);
        self.state = state;
        self.episode = episode;
    }

    /// Report a contact between the parent and `other`
    ///
    /// `normal_impulse` is in engine units (kg·cm/s) and is converted here.
    pub fn on_collision(
        &self,
        other: EngineHandle,
        normal_impulse: Vector3,
        sensor_transform: &Transform,
        sink: &dyn EventSink,
    ) -> Option<CollisionRecord> {
        if self.state != SensorState::Active || other == self.parent {
            return None;
        }
        let Some(episode) = self.episode.try_lock() else {
            trace!(sensor_id = %self.sensor_id, "episode gone, dropping collision");
            return None;
        };

        let timestamp = episode.timestamp();
        let actor = episode.actors().find_or_fake(self.parent);
        let other_actor = episode.actors().find_or_fake(other);
        episode.record_collision(&actor, &other_actor);

        let record = CollisionRecord {
            header: EventHeader {
                sensor_id: self.sensor_id.clone(),
                frame: timestamp.frame,
                timestamp: timestamp.elapsed_seconds,
                sensor_transform: *sensor_transform,
            },
            actor,
            other_actor,
            normal_impulse: normal_impulse.to_meters(),
        };

        debug!(
            sensor_id = %self.sensor_id,
            frame = timestamp.frame,
            actor_id = record.actor.id,
            other_id = record.other_actor.id,
            "collision"
        );
        sink.send(SensorEvent::Collision(record.clone()));
        Some(record)
    }
}
