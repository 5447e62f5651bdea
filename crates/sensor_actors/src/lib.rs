//! # Sensor Actors
//!
//! Host-side sensors, expressed as engine-independent per-frame logic.
//!
//! The host (engine, or `sim_world` in this workspace) owns scheduling and
//! scene queries. Each sensor here is a plain value that:
//! - binds to an episode at start-up, disabling itself permanently if none
//!   is available
//! - turns (pose, configuration, [`WorldQuery`]) into at most one event per
//!   frame, pushed to an [`EventSink`] without waiting for delivery
//!
//! [`WorldQuery`]: contracts::WorldQuery
//! [`EventSink`]: contracts::EventSink

mod attributes;
mod collision;
mod lifecycle;
mod obstacle;

pub use attributes::{retrieve_bool, retrieve_float, ObstacleDetectorConfig};
pub use collision::CollisionSensor;
pub use lifecycle::SensorState;
pub use obstacle::{detect, sweep_request, ObstacleDetectionSensor, DEBUG_TRACE_TAG};
