//! Obstacle detection reading

use contracts::{ActorSnapshot, Location, Meters, Vector3};

use crate::data::{SensorData, SensorDataBase};

/// An obstacle in front of the probe, client units (meters)
#[derive(Debug, Clone)]
pub struct ObstacleDetectionEvent {
    base: SensorData,
    actor: ActorSnapshot,
    other_actor: Option<ActorSnapshot>,
    distance: Meters,
    hit_radius: Meters,
    hit_location: Location,
    hit_normal: Vector3,
}

impl ObstacleDetectionEvent {
    pub fn new(
        base: SensorData,
        actor: ActorSnapshot,
        other_actor: Option<ActorSnapshot>,
        distance: Meters,
        hit_radius: Meters,
        hit_location: Location,
        hit_normal: Vector3,
    ) -> Self {
        Self {
            base,
            actor,
            other_actor,
            distance,
            hit_radius,
            hit_location,
            hit_normal,
        }
    }

    /// Probe identity as serialized at detection time
    pub fn actor_snapshot(&self) -> &ActorSnapshot {
        &self.actor
    }

    /// Struck identity as serialized at detection time
    pub fn other_actor_snapshot(&self) -> Option<&ActorSnapshot> {
        self.other_actor.as_ref()
    }

    /// Probe actor as currently known to the episode
    ///
    /// `None` once the episode has ended or the actor was destroyed.
    pub fn actor(&self) -> Option<ActorSnapshot> {
        let episode = self.base.episode().try_lock()?;
        episode.actors().find(self.actor.id)
    }

    /// Struck actor as currently known to the episode
    pub fn other_actor(&self) -> Option<ActorSnapshot> {
        let other_id = self.other_actor.as_ref()?.id;
        let episode = self.base.episode().try_lock()?;
        episode.actors().find(other_id)
    }

    /// Distance from the probe to the obstacle
    pub fn distance(&self) -> Meters {
        self.distance
    }

    /// Sweep radius the probe was configured with
    pub fn hit_radius(&self) -> Meters {
        self.hit_radius
    }

    pub fn hit_location(&self) -> Location {
        self.hit_location
    }

    pub fn hit_normal(&self) -> Vector3 {
        self.hit_normal
    }
}

impl SensorDataBase for ObstacleDetectionEvent {
    fn base(&self) -> &SensorData {
        &self.base
    }
}
