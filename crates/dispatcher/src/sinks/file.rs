//! FileSink - JSON lines, one file per sensor

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use contracts::{ActorSnapshot, ContractError, Location, Meters, SensorId, Transform, Vector3};
use sensor_data::{SensorDataBase, SensorMeasurement};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::sink::{DataSink, Reading};

#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory; `<sensor_id>.jsonl` files are created inside
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Serialized form of a reading
#[derive(Debug, Serialize)]
struct ReadingRecord<'a> {
    sensor_id: &'a str,
    frame: u64,
    timestamp: f64,
    sensor_transform: &'a Transform,
    #[serde(flatten)]
    detail: Detail<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Detail<'a> {
    Obstacle {
        actor: &'a ActorSnapshot,
        other_actor: Option<&'a ActorSnapshot>,
        distance: Meters,
        hit_radius: Meters,
        hit_location: Location,
        hit_normal: Vector3,
    },
    Collision {
        actor: &'a ActorSnapshot,
        other_actor: &'a ActorSnapshot,
        normal_impulse: Vector3,
    },
    Gnss {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },
}

impl<'a> ReadingRecord<'a> {
    fn new(reading: &'a Reading) -> Self {
        let m = reading.measurement.as_ref();
        let detail = match m {
            SensorMeasurement::ObstacleDetection(e) => Detail::Obstacle {
                actor: e.actor_snapshot(),
                other_actor: e.other_actor_snapshot(),
                distance: e.distance(),
                hit_radius: e.hit_radius(),
                hit_location: e.hit_location(),
                hit_normal: e.hit_normal(),
            },
            SensorMeasurement::Collision(e) => Detail::Collision {
                actor: e.actor_snapshot(),
                other_actor: e.other_actor_snapshot(),
                normal_impulse: e.normal_impulse(),
            },
            SensorMeasurement::Gnss(fix) => Detail::Gnss {
                latitude: fix.latitude(),
                longitude: fix.longitude(),
                altitude: fix.altitude(),
            },
        };
        Self {
            sensor_id: reading.sensor_id.as_str(),
            frame: m.frame(),
            timestamp: m.timestamp(),
            sensor_transform: m.sensor_transform(),
            detail,
        }
    }
}

pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<SensorId, BufWriter<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    fn writer(&mut self, sensor_id: &SensorId) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(sensor_id) {
            let path = self.config.base_path.join(format!("{sensor_id}.jsonl"));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(sink = %self.name, path = %path.display(), "Opened output file");
            self.writers.insert(sensor_id.clone(), BufWriter::new(file));
        }
        self.writers
            .get_mut(sensor_id)
            .ok_or_else(|| std::io::Error::other("writer missing after insert"))
    }

    fn append(&mut self, reading: &Reading) -> std::io::Result<()> {
        let record = ReadingRecord::new(reading);
        let writer = self.writer(&reading.sensor_id)?;
        serde_json::to_writer(&mut *writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }

    fn flush_all(&mut self) -> Result<(), ContractError> {
        for (sensor_id, writer) in &mut self.writers {
            writer.flush().map_err(|e| {
                error!(sink = %self.name, sensor_id = %sensor_id, error = %e, "Flush failed");
                ContractError::sink_write(&self.name, e.to_string())
            })?;
        }
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, reading),
        fields(sink = %self.name, sensor_id = %reading.sensor_id)
    )]
    async fn write(&mut self, reading: &Reading) -> Result<(), ContractError> {
        self.append(reading).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::gnss_reading;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_writes_json_lines() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            base_path: dir.path().to_path_buf(),
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&gnss_reading(1)).await.unwrap();
        sink.write(&gnss_reading(2)).await.unwrap();
        sink.close().await.unwrap();

        let contents = fs::read_to_string(dir.path().join("gnss.jsonl")).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "gnss");
        assert_eq!(lines[0]["sensor_id"], "gnss");
        assert_eq!(lines[1]["frame"], 2);
        assert_eq!(lines[0]["latitude"], 42.0);
    }

    #[test]
    fn test_config_default_path() {
        let config = FileSinkConfig::from_params(&HashMap::new());
        assert_eq!(config.base_path, PathBuf::from("./output"));
    }
}
