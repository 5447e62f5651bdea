//! DataSink trait - reading consumer interface

use std::sync::Arc;

use contracts::{ContractError, SensorId};
use sensor_data::SensorMeasurement;

/// One reading, tagged with the sensor that produced it
///
/// Cheap to clone; every sink shares the same measurement.
#[derive(Debug, Clone)]
pub struct Reading {
    pub sensor_id: SensorId,
    pub measurement: Arc<SensorMeasurement>,
}

/// Reading output
///
/// Each sink runs on its own worker task, see [`SinkHandle`](crate::SinkHandle).
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one reading
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, reading: &Reading) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
