//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Simulation clock in seconds (f64), advanced by the host once per frame
//! - `frame` is the simulation step counter, paired 1:1 with the timestamp
//!
//! ## Units
//! - Engine-side geometry (world, sweeps, obstacle events) is in centimeters
//! - Client-side readings and configuration attributes are in meters
//! - Conversions go through [`Meters`] / [`Centimeters`], never bare multipliers

mod actor;
mod blueprint;
mod error;
mod event;
mod geom;
mod query;
mod raw;
mod sensor;
mod sensor_id;
mod sink;
mod units;

pub use actor::*;
pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use geom::*;
pub use query::*;
pub use raw::{RawBuffer, RawData, RAW_HEADER_SIZE};
pub use sensor::*;
pub use sensor_id::SensorId;
pub use sink::*;
pub use units::*;
