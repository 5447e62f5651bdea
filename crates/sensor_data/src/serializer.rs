//! Payload (de)serialization over raw buffers
//!
//! The raw header carries frame, timestamp and sensor pose; payloads are
//! bincode-encoded. Host events arrive in engine units (cm) and are converted
//! to client units (m) here, once.

use bytes::Bytes;
use contracts::{
    ActorSnapshot, Centimeters, CollisionRecord, EventHeader, Location, ObstacleEvent, RawBuffer,
    RawData, SensorEvent, SensorType, Vector3,
};
use episode::WeakEpisodeProxy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionEvent;
use crate::data::{SensorData, SensorDataBase};
use crate::error::{Result, SensorDataError};
use crate::gnss::GnssMeasurement;
use crate::measurement::SensorMeasurement;
use crate::obstacle::ObstacleDetectionEvent;

#[derive(Debug, Serialize, Deserialize)]
struct ObstaclePayload {
    actor: ActorSnapshot,
    other_actor: Option<ActorSnapshot>,
    distance: Centimeters,
    hit_radius: Centimeters,
    hit_location: Location,
    hit_normal: Vector3,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollisionPayload {
    actor: ActorSnapshot,
    other_actor: ActorSnapshot,
    normal_impulse: Vector3,
}

#[derive(Debug, Serialize, Deserialize)]
struct GnssPayload {
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

fn encode<T: Serialize>(sensor_type: SensorType, payload: &T) -> Result<Bytes> {
    bincode::serialize(payload)
        .map(Bytes::from)
        .map_err(|e| SensorDataError::PayloadEncode {
            sensor_type,
            message: e.to_string(),
        })
}

fn decode<T: DeserializeOwned>(raw: &RawBuffer) -> Result<T> {
    bincode::deserialize(raw.payload()).map_err(|e| SensorDataError::PayloadDecode {
        sensor_type: raw.sensor_type(),
        message: e.to_string(),
    })
}

fn raw_from_header(header: &EventHeader, sensor_type: SensorType, payload: Bytes) -> RawBuffer {
    RawBuffer::new(
        header.frame,
        header.timestamp,
        header.sensor_transform.to_meters(),
        sensor_type,
        payload,
    )
}

/// Encode a host-side event for the data stream
pub fn serialize_event(event: &SensorEvent) -> Result<RawBuffer> {
    match event {
        SensorEvent::Obstacle(event) => serialize_obstacle(event),
        SensorEvent::Collision(record) => serialize_collision(record),
    }
}

fn serialize_obstacle(event: &ObstacleEvent) -> Result<RawBuffer> {
    let payload = ObstaclePayload {
        actor: event.actor.clone(),
        other_actor: event.other_actor.clone(),
        distance: event.distance,
        hit_radius: event.hit_radius,
        hit_location: event.hit.location,
        hit_normal: event.hit.normal,
    };
    let bytes = encode(SensorType::ObstacleDetector, &payload)?;
    Ok(raw_from_header(&event.header, SensorType::ObstacleDetector, bytes))
}

fn serialize_collision(record: &CollisionRecord) -> Result<RawBuffer> {
    let payload = CollisionPayload {
        actor: record.actor.clone(),
        other_actor: record.other_actor.clone(),
        normal_impulse: record.normal_impulse,
    };
    let bytes = encode(SensorType::Collision, &payload)?;
    Ok(raw_from_header(&record.header, SensorType::Collision, bytes))
}

/// Encode a GNSS reading (already in client units)
pub fn serialize_gnss(fix: &GnssMeasurement) -> Result<RawBuffer> {
    let payload = GnssPayload {
        latitude: fix.latitude(),
        longitude: fix.longitude(),
        altitude: fix.altitude(),
    };
    let bytes = encode(SensorType::Gnss, &payload)?;
    Ok(RawBuffer::new(
        fix.frame(),
        fix.timestamp(),
        *fix.sensor_transform(),
        SensorType::Gnss,
        bytes,
    ))
}

/// Decode a raw buffer into a reading attached to `episode`
///
/// # Errors
/// Payload does not match the layout announced by the header.
pub fn deserialize(raw: RawBuffer, episode: WeakEpisodeProxy) -> Result<SensorMeasurement> {
    let base = SensorData::from_raw(&raw).with_episode(episode);

    let measurement = match raw.sensor_type() {
        SensorType::ObstacleDetector => {
            let p: ObstaclePayload = decode(&raw)?;
            SensorMeasurement::ObstacleDetection(ObstacleDetectionEvent::new(
                base,
                p.actor,
                p.other_actor,
                p.distance.to_meters(),
                p.hit_radius.to_meters(),
                p.hit_location.to_meters(),
                p.hit_normal,
            ))
        }
        SensorType::Collision => {
            let p: CollisionPayload = decode(&raw)?;
            SensorMeasurement::Collision(CollisionEvent::new(
                base,
                p.actor,
                p.other_actor,
                p.normal_impulse,
            ))
        }
        SensorType::Gnss => {
            let p: GnssPayload = decode(&raw)?;
            SensorMeasurement::Gnss(GnssMeasurement::new(
                base,
                p.latitude,
                p.longitude,
                p.altitude,
            ))
        }
    };

    Ok(measurement)
}
