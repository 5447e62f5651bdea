//! # Sensor Data
//!
//! Client-side sensor readings.
//!
//! Every reading is an immutable envelope ([`SensorData`]: frame, timestamp,
//! sensor pose, weak episode handle) plus a modality-specific payload. The
//! modalities form a closed set, [`SensorMeasurement`], shared between
//! consumers as `Arc<SensorMeasurement>`.
//!
//! ## Usage
//!
//! ```ignore
//! use sensor_data::{deserialize, SensorDataBase};
//!
//! let reading = deserialize(raw_buffer, episode.downgrade())?;
//! println!("frame {} at {:.3}s", reading.frame(), reading.timestamp());
//! ```

mod collision;
mod data;
mod error;
mod gnss;
mod measurement;
mod obstacle;
mod serializer;

pub use collision::CollisionEvent;
pub use data::{SensorData, SensorDataBase};
pub use error::{Result, SensorDataError};
pub use gnss::{geo, GeoReference, GnssMeasurement, GnssSensor};
pub use measurement::{ReadingCallback, SensorMeasurement};
pub use obstacle::ObstacleDetectionEvent;
pub use serializer::{deserialize, serialize_event, serialize_gnss};
