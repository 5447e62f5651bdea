//! LogSink - one tracing line per reading

use contracts::ContractError;
use sensor_data::{SensorDataBase, SensorMeasurement};
use tracing::{info, instrument};

use crate::sink::{DataSink, Reading};

pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_reading(&self, reading: &Reading) {
        let m = reading.measurement.as_ref();
        match m {
            SensorMeasurement::ObstacleDetection(e) => info!(
                sink = %self.name,
                sensor_id = %reading.sensor_id,
                frame = m.frame(),
                actor = %e.actor_snapshot(),
                other_actor = ?e.other_actor_snapshot().map(|a| a.id),
                distance = %e.distance(),
                "Obstacle detected"
            ),
            SensorMeasurement::Collision(e) => info!(
                sink = %self.name,
                sensor_id = %reading.sensor_id,
                frame = m.frame(),
                actor = %e.actor_snapshot(),
                other_actor = %e.other_actor_snapshot(),
                impulse = ?e.normal_impulse(),
                "Collision"
            ),
            SensorMeasurement::Gnss(fix) => info!(
                sink = %self.name,
                sensor_id = %reading.sensor_id,
                frame = m.frame(),
                latitude = fix.latitude(),
                longitude = fix.longitude(),
                altitude = fix.altitude(),
                "GNSS fix"
            ),
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, reading),
        fields(sink = %self.name, sensor_id = %reading.sensor_id)
    )]
    async fn write(&mut self, reading: &Reading) -> Result<(), ContractError> {
        self.log_reading(reading);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
