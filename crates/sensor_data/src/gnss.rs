//! GNSS reading and the client-side GNSS sensor
//!
//! The GNSS sensor has no server-side counterpart: on every tick it converts
//! its own location into latitude/longitude around the map's geo reference.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{SensorId, Transform};
use episode::{Timestamp, WeakEpisodeProxy};
use tracing::{debug, trace, warn};

use crate::data::{SensorData, SensorDataBase};
use crate::measurement::{ReadingCallback, SensorMeasurement};

/// Mercator helpers
pub mod geo {
    use std::f64::consts::PI;

    /// Earth radius at the equator (m)
    pub const EARTH_RADIUS_EQUA: f64 = 6378137.0;

    /// Mercator scale for a latitude (degrees).
    ///
    /// Use the same scale for a conversion and its inverse.
    #[inline]
    pub fn lat_to_scale(lat: f64) -> f64 {
        (lat * PI / 180.0).cos()
    }

    /// Latitude/longitude (degrees) to Mercator meters
    #[inline]
    pub fn lat_lon_to_mercator(lat: f64, lon: f64, scale: f64) -> (f64, f64) {
        let mx = scale * lon * PI * EARTH_RADIUS_EQUA / 180.0;
        let my = scale * EARTH_RADIUS_EQUA * ((90.0 + lat) * PI / 360.0).tan().ln();
        (mx, my)
    }

    /// Mercator meters to latitude/longitude (degrees)
    #[inline]
    pub fn mercator_to_lat_lon(mx: f64, my: f64, scale: f64) -> (f64, f64) {
        let lon = mx * 180.0 / (PI * EARTH_RADIUS_EQUA * scale);
        let lat = 360.0 * (my / (EARTH_RADIUS_EQUA * scale)).exp().atan() / PI - 90.0;
        (lat, lon)
    }

    /// Offset a latitude/longitude by `dx`/`dy` meters
    pub fn lat_lon_add_meters(lat: f64, lon: f64, dx: f64, dy: f64) -> (f64, f64) {
        let scale = lat_to_scale(lat);
        let (mx, my) = lat_lon_to_mercator(lat, lon, scale);
        mercator_to_lat_lon(mx + dx, my + dy, scale)
    }
}

/// Map origin in geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoReference {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoReference {
    /// Used when the map's geo reference cannot be parsed
    pub const FALLBACK: Self = Self {
        latitude: 42.0,
        longitude: 2.0,
    };

    /// Parse `+lat_0=<deg> +lon_0=<deg>` out of a PROJ-style string
    ///
    /// Unknown keys and malformed tokens are skipped. `None` unless both
    /// values parse.
    pub fn parse(geo_reference: &str) -> Option<Self> {
        let mut latitude = None;
        let mut longitude = None;

        for token in geo_reference.split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            match key {
                "+lat_0" => latitude = value.parse::<f64>().ok(),
                "+lon_0" => longitude = value.parse::<f64>().ok(),
                _ => {}
            }
        }

        Some(Self {
            latitude: latitude.filter(|v| v.is_finite())?,
            longitude: longitude.filter(|v| v.is_finite())?,
        })
    }

    /// Parse, falling back to [`GeoReference::FALLBACK`] with a warning
    pub fn parse_or_fallback(sensor_id: &str, geo_reference: Option<&str>) -> Self {
        let raw = geo_reference.unwrap_or_default();
        match Self::parse(raw) {
            Some(parsed) => parsed,
            None => {
                warn!(
                    sensor_id = %sensor_id,
                    geo_reference = %raw,
                    "cannot parse georeference, using default values"
                );
                Self::FALLBACK
            }
        }
    }
}

/// GNSS fix
#[derive(Debug, Clone)]
pub struct GnssMeasurement {
    base: SensorData,
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl GnssMeasurement {
    pub fn new(base: SensorData, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            base,
            latitude,
            longitude,
            altitude,
        }
    }

    /// Degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Meters
    pub fn altitude(&self) -> f64 {
        self.altitude
    }
}

impl SensorDataBase for GnssMeasurement {
    fn base(&self) -> &SensorData {
        &self.base
    }
}

/// Client-side GNSS sensor
///
/// The host calls [`GnssSensor::on_tick`] once per frame with the sensor's
/// world pose in meters; while listening, each tick yields one reading.
pub struct GnssSensor {
    sensor_id: SensorId,
    reference: GeoReference,
    episode: WeakEpisodeProxy,
    listening: AtomicBool,
    callback: Mutex<Option<ReadingCallback>>,
}

impl GnssSensor {
    /// Create a sensor bound to `episode`, reading its geo reference
    pub fn new(sensor_id: impl Into<SensorId>, episode: WeakEpisodeProxy) -> Self {
        let sensor_id = sensor_id.into();
        let geo_reference = episode
            .try_lock()
            .and_then(|ep| ep.geo_reference().map(str::to_owned));
        let reference = GeoReference::parse_or_fallback(&sensor_id, geo_reference.as_deref());

        debug!(
            sensor_id = %sensor_id,
            latitude = reference.latitude,
            longitude = reference.longitude,
            "map geo reference"
        );

        Self {
            sensor_id,
            reference,
            episode,
            listening: AtomicBool::new(false),
            callback: Mutex::new(None),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn reference(&self) -> GeoReference {
        self.reference
    }

    /// Start delivering readings. A second call while listening is ignored.
    pub fn listen(&self, callback: ReadingCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(sensor_id = %self.sensor_id, "already listening");
            return;
        }
        *self.callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);
        debug!(sensor_id = %self.sensor_id, "subscribing to tick event");
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.callback.lock().unwrap_or_else(|e| e.into_inner()).take();
            debug!(sensor_id = %self.sensor_id, "stopped listening");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    /// Compute the fix for a pose (meters), independent of listening state
    pub fn measure(&self, timestamp: &Timestamp, transform: Transform) -> GnssMeasurement {
        let location = transform.location;
        let (latitude, longitude) = geo::lat_lon_add_meters(
            self.reference.latitude,
            self.reference.longitude,
            location.x,
            location.y,
        );

        GnssMeasurement::new(
            SensorData::new(timestamp.frame, timestamp.elapsed_seconds, transform)
                .with_episode(self.episode.clone()),
            latitude,
            longitude,
            location.z,
        )
    }

    /// Tick handler. Skips silently when not listening or the episode ended.
    pub fn on_tick(&self, timestamp: &Timestamp, transform: Transform) {
        if !self.is_listening() || self.episode.is_expired() {
            return;
        }

        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(callback) = callback {
            let reading = self.measure(timestamp, transform);
            trace!(sensor_id = %self.sensor_id, frame = timestamp.frame, "gnss reading");
            callback(Arc::new(SensorMeasurement::Gnss(reading)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Location;
    use episode::Episode;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_parse_geo_reference() {
        let parsed = GeoReference::parse(
            "+proj=tmerc +lat_0=49.0 +lon_0=8.0 +k=1 +x_0=0 +y_0=0 +datum=WGS84",
        )
        .unwrap();
        assert_eq!(parsed.latitude, 49.0);
        assert_eq!(parsed.longitude, 8.0);
    }

    #[test]
    fn test_parse_geo_reference_missing_key() {
        assert!(GeoReference::parse("+lat_0=49.0").is_none());
        assert!(GeoReference::parse("+lat_0=abc +lon_0=8.0").is_none());
        assert_eq!(
            GeoReference::parse_or_fallback("gnss", None),
            GeoReference::FALLBACK
        );
    }

    #[test]
    fn test_mercator_round_trip_origin() {
        let scale = geo::lat_to_scale(42.0);
        let (mx, my) = geo::lat_lon_to_mercator(42.0, 2.0, scale);
        let (lat, lon) = geo::mercator_to_lat_lon(mx, my, scale);
        assert!((lat - 42.0).abs() < 1e-9);
        assert!((lon - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_meters_moves_east_and_north() {
        let (lat, lon) = geo::lat_lon_add_meters(42.0, 2.0, 1000.0, 1000.0);
        assert!(lon > 2.0);
        assert!(lat > 42.0);
        // ~1km of longitude at 42° is roughly 0.012°
        assert!((lon - 2.0 - 0.0121).abs() < 0.001);
    }

    #[test]
    fn test_on_tick_delivers_when_listening() {
        let episode = Episode::start(1, "Town01", Some("+lat_0=0.0 +lon_0=0.0".into()));
        let sensor = GnssSensor::new("gnss", episode.downgrade());
        let received = Arc::new(AtomicUsize::new(0));
        let ts = Timestamp {
            frame: 1,
            elapsed_seconds: 0.05,
            delta_seconds: 0.05,
        };
        let pose = Transform::new(Location::new(0.0, 0.0, 12.0), Default::default());

        sensor.on_tick(&ts, pose);
        assert_eq!(received.load(Ordering::SeqCst), 0);

        let counter = Arc::clone(&received);
        sensor.listen(Arc::new(move |reading: Arc<SensorMeasurement>| {
            assert_eq!(reading.frame(), 1);
            if let SensorMeasurement::Gnss(fix) = &*reading {
                assert_eq!(fix.altitude(), 12.0);
                assert!(fix.latitude().abs() < 1e-9);
            }
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        sensor.on_tick(&ts, pose);
        assert_eq!(received.load(Ordering::SeqCst), 1);

        episode.end();
        sensor.on_tick(&ts, pose);
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop() {
        let episode = Episode::start(1, "Town01", None);
        let sensor = GnssSensor::new("gnss", episode.downgrade());
        assert_eq!(sensor.reference(), GeoReference::FALLBACK);
        sensor.listen(Arc::new(|_: Arc<SensorMeasurement>| {}));
        assert!(sensor.is_listening());
        sensor.stop();
        assert!(!sensor.is_listening());
    }
}
