//! Sensor taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor type
///
/// Closed set: each variant has exactly one reading layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// `sensor.other.obstacle`
    ObstacleDetector,
    /// `sensor.other.collision`
    Collision,
    /// `sensor.other.gnss`
    Gnss,
}

impl SensorType {
    /// Tag stored in the raw buffer header
    pub fn tag(self) -> u32 {
        match self {
            Self::ObstacleDetector => 1,
            Self::Collision => 2,
            Self::Gnss => 3,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::ObstacleDetector),
            2 => Some(Self::Collision),
            3 => Some(Self::Gnss),
            _ => None,
        }
    }

    /// Blueprint id the sensor is spawned from
    pub fn blueprint_id(self) -> &'static str {
        match self {
            Self::ObstacleDetector => "sensor.other.obstacle",
            Self::Collision => "sensor.other.collision",
            Self::Gnss => "sensor.other.gnss",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.blueprint_id())
    }
}
