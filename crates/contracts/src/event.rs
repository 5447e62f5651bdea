//! Host-side sensor events
//!
//! Produced once per trigger, handed to an [`EventSink`](crate::EventSink)
//! and never retained by the producer.

use serde::{Deserialize, Serialize};

use crate::{ActorSnapshot, Centimeters, EngineHandle, Location, SensorId, Transform, Vector3};

/// Result of a single sweep hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Struck object, if the hit geometry belongs to one
    pub handle: Option<EngineHandle>,

    /// Distance travelled along the sweep before contact
    pub distance: Centimeters,

    /// Contact point
    pub location: Location,

    /// Surface normal at the contact point
    pub normal: Vector3,
}

/// Header shared by every host-side event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Emitting sensor
    pub sensor_id: SensorId,

    /// Simulation step
    pub frame: u64,

    /// Simulation clock (seconds)
    pub timestamp: f64,

    /// Sensor pose at capture time
    pub sensor_transform: Transform,
}

/// Obstacle detected in front of a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleEvent {
    pub header: EventHeader,

    /// The probe itself
    pub actor: ActorSnapshot,

    /// The struck entity, `None` when the hit geometry has no owner
    pub other_actor: Option<ActorSnapshot>,

    /// Hit distance along the sweep
    pub distance: Centimeters,

    /// Configured sweep radius (echo)
    pub hit_radius: Centimeters,

    /// Hit metadata
    pub hit: HitResult,
}

/// Collision reported by a collision sensor's parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub header: EventHeader,

    /// Actor the sensor is attached to
    pub actor: ActorSnapshot,

    /// Actor it collided with
    pub other_actor: ActorSnapshot,

    /// Normal impulse in N·s (meters)
    pub normal_impulse: Vector3,
}

/// Any host-side event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorEvent {
    Obstacle(ObstacleEvent),
    Collision(CollisionRecord),
}

impl SensorEvent {
    pub fn header(&self) -> &EventHeader {
        match self {
            Self::Obstacle(e) => &e.header,
            Self::Collision(e) => &e.header,
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.header().sensor_id
    }
}
