//! ScenarioBlueprint - Config Loader output
//!
//! Describes a complete scenario: episode settings, world actors with their
//! colliders, attached sensors, and output sinks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{SensorType, Transform, Vector3};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full scenario blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Episode (session) settings
    pub episode: EpisodeConfig,

    /// World actors
    #[serde(default)]
    pub actors: Vec<ActorConfig>,

    /// Sensors, optionally attached to an actor
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Episode settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EpisodeConfig {
    /// Map name (e.g. "Town01")
    #[validate(length(min = 1))]
    pub map: String,

    /// PROJ-style geo reference, e.g. "+lat_0=49.0 +lon_0=8.0"
    #[serde(default)]
    pub geo_reference: Option<String>,

    /// Fixed simulation step (seconds)
    #[serde(default = "default_fixed_delta")]
    #[validate(range(exclusive_min = 0.0))]
    pub fixed_delta_seconds: f64,

    /// Number of frames `run` simulates when not overridden
    #[serde(default = "default_frames")]
    pub frames: u64,
}

fn default_fixed_delta() -> f64 {
    0.05
}

fn default_frames() -> u64 {
    100
}

/// Whether an actor participates in dynamic or static queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mobility {
    /// World geometry (buildings, poles, props)
    #[default]
    Static,
    /// Vehicles, walkers, physics objects
    Dynamic,
}

/// Collision shape, engine units (cm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeConfig {
    Sphere { radius: f64 },
    Box { half_extents: Vector3 },
}

/// World actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Unique identifier
    pub id: String,

    /// Blueprint name (e.g. "vehicle.tesla.model3")
    pub blueprint: String,

    /// Spawn pose, engine units (cm)
    pub transform: Transform,

    #[serde(default)]
    pub mobility: Mobility,

    pub shape: ShapeConfig,

    /// Constant velocity for dynamic actors (cm/s)
    #[serde(default)]
    pub velocity: Vector3,

    /// Unregistered actors get a placeholder identity when first struck
    #[serde(default = "default_registered")]
    pub registered: bool,
}

fn default_registered() -> bool {
    true
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Unique identifier
    pub id: String,

    /// Sensor type
    pub sensor_type: SensorType,

    /// Parent actor id; the sensor follows it
    #[serde(default)]
    pub parent: Option<String>,

    /// Pose relative to the parent (or world if unattached), engine units
    #[serde(default)]
    pub transform: Transform,

    /// Blueprint attributes, e.g. `distance = "5.0"`
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log via tracing
    Log,
    /// JSON lines on disk
    File,
}
