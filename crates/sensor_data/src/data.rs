//! SensorData - common envelope of every reading

use contracts::{RawData, Transform};
use episode::WeakEpisodeProxy;

/// What a sensor produced, when, and from where
///
/// Immutable after construction. `frame` and `timestamp` always describe the
/// same simulation step, and the transform is the *sensor's* pose, never the
/// pose of anything it detected.
#[derive(Debug, Clone)]
pub struct SensorData {
    frame: u64,
    timestamp: f64,
    sensor_transform: Transform,
    episode: WeakEpisodeProxy,
}

impl SensorData {
    /// Build from explicit fields. The caller guarantees they belong to one step.
    pub fn new(frame: u64, timestamp: f64, sensor_transform: Transform) -> Self {
        Self {
            frame,
            timestamp,
            sensor_transform,
            episode: WeakEpisodeProxy::default(),
        }
    }

    /// Build from a raw capture buffer
    pub fn from_raw(raw: &impl RawData) -> Self {
        Self::new(raw.frame_number(), raw.timestamp(), raw.sensor_transform())
    }

    /// Attach the owning episode before the reading is shared
    pub fn with_episode(mut self, episode: WeakEpisodeProxy) -> Self {
        self.episode = episode;
        self
    }

    /// Frame count when the data was generated
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulation time the data was generated (seconds)
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Sensor's transform when the data was generated
    pub fn sensor_transform(&self) -> &Transform {
        &self.sensor_transform
    }

    /// Owning episode, for readings that resolve other simulation entities
    pub(crate) fn episode(&self) -> &WeakEpisodeProxy {
        &self.episode
    }
}

/// Common accessors of every reading type
pub trait SensorDataBase {
    /// Shared envelope
    fn base(&self) -> &SensorData;

    fn frame(&self) -> u64 {
        self.base().frame()
    }

    fn timestamp(&self) -> f64 {
        self.base().timestamp()
    }

    fn sensor_transform(&self) -> &Transform {
        self.base().sensor_transform()
    }
}

impl SensorDataBase for SensorData {
    fn base(&self) -> &SensorData {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{Location, RawBuffer, Rotation, SensorType};
    use episode::Episode;

    fn pose() -> Transform {
        Transform::new(Location::new(1.5, -3.0, 0.2), Rotation::new(0.0, 45.0, 0.0))
    }

    #[test]
    fn test_accessors_return_inputs() {
        for (frame, timestamp) in [(0u64, 0.0), (1, 0.05), (u64::MAX, 1.0e9)] {
            let data = SensorData::new(frame, timestamp, pose());
            assert_eq!(data.frame(), frame);
            assert_eq!(data.timestamp(), timestamp);
            assert_eq!(*data.sensor_transform(), pose());
        }
    }

    #[test]
    fn test_from_raw_matches_direct() {
        let raw = RawBuffer::new(17, 0.85, pose(), SensorType::Gnss, Bytes::new());
        let from_raw = SensorData::from_raw(&raw);
        let direct = SensorData::new(17, 0.85, pose());
        assert_eq!(from_raw.frame(), direct.frame());
        assert_eq!(from_raw.timestamp(), direct.timestamp());
        assert_eq!(from_raw.sensor_transform(), direct.sensor_transform());
    }

    #[test]
    fn test_episode_expires_with_session() {
        let episode = Episode::start(1, "Town01", None);
        let data = SensorData::new(1, 0.05, pose()).with_episode(episode.downgrade());
        assert!(data.episode().try_lock().is_some());

        drop(episode);
        assert!(data.episode().try_lock().is_none());
        // Accessors are unaffected by the session going away
        assert_eq!(data.frame(), 1);
    }

    #[test]
    fn test_without_episode() {
        let data = SensorData::new(3, 0.15, pose());
        assert!(data.episode().is_expired());
    }
}
