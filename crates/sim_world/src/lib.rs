//! # Sim World
//!
//! A minimal simulation host: rigid bodies with simple colliders, a sphere
//! sweep query, and the frame scheduler that drives sensors.
//!
//! Stands in for the game engine so the sensor pipeline can run headless.
//! Engine units throughout (centimeters, degrees).

mod error;
mod simulation;
mod world;

pub use error::{Result, SimError};
pub use simulation::{FrameReport, Simulation};
pub use world::{Body, Collider, Contact, DebugTrace, World};
