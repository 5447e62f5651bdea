//! SensorMeasurement - closed set of reading types

use std::sync::Arc;

use contracts::SensorType;

use crate::collision::CollisionEvent;
use crate::data::{SensorData, SensorDataBase};
use crate::gnss::GnssMeasurement;
use crate::obstacle::ObstacleDetectionEvent;

/// Reading delivery callback
///
/// Readings are shared, so every consumer receives the same `Arc`.
pub type ReadingCallback = Arc<dyn Fn(Arc<SensorMeasurement>) + Send + Sync>;

/// Any reading
#[derive(Debug, Clone)]
pub enum SensorMeasurement {
    Gnss(GnssMeasurement),
    Collision(CollisionEvent),
    ObstacleDetection(ObstacleDetectionEvent),
}

impl SensorMeasurement {
    pub fn sensor_type(&self) -> SensorType {
        match self {
            Self::Gnss(_) => SensorType::Gnss,
            Self::Collision(_) => SensorType::Collision,
            Self::ObstacleDetection(_) => SensorType::ObstacleDetector,
        }
    }

    pub fn as_obstacle(&self) -> Option<&ObstacleDetectionEvent> {
        match self {
            Self::ObstacleDetection(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_collision(&self) -> Option<&CollisionEvent> {
        match self {
            Self::Collision(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_gnss(&self) -> Option<&GnssMeasurement> {
        match self {
            Self::Gnss(fix) => Some(fix),
            _ => None,
        }
    }
}

impl SensorDataBase for SensorMeasurement {
    fn base(&self) -> &SensorData {
        match self {
            Self::Gnss(m) => m.base(),
            Self::Collision(m) => m.base(),
            Self::ObstacleDetection(m) => m.base(),
        }
    }
}
