//! Raw capture buffer
//!
//! Lowest-level representation of a sensor sample as it travels over a data
//! stream: a fixed header (frame, timestamp, sensor pose, sensor type)
//! followed by an opaque, sensor-specific payload.

use bytemuck::{Pod, Zeroable};
use bytes::{BufMut, Bytes, BytesMut};

use crate::{ContractError, Location, Rotation, SensorType, Transform};

/// Anything a reading can be built from
pub trait RawData {
    /// Simulation step that produced the sample
    fn frame_number(&self) -> u64;

    /// Simulation clock at capture (seconds)
    fn timestamp(&self) -> f64;

    /// Sensor pose at capture
    fn sensor_transform(&self) -> Transform;

    /// Sensor-specific payload
    fn payload(&self) -> &[u8];
}

/// Wire header; every field holds little-endian bits
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawHeader {
    frame: u64,
    /// `f64` bits
    timestamp: u64,
    /// `f64` bits of x, y, z, pitch, yaw, roll
    transform: [u64; 6],
    sensor_tag: u32,
    _reserved: u32,
}

fn f64_to_le(value: f64) -> u64 {
    value.to_bits().to_le()
}

fn f64_from_le(bits: u64) -> f64 {
    f64::from_bits(u64::from_le(bits))
}

/// Size in bytes of the encoded header
pub const RAW_HEADER_SIZE: usize = std::mem::size_of::<RawHeader>();

/// Header + payload, cheap to clone
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffer {
    frame: u64,
    timestamp: f64,
    transform: Transform,
    sensor_type: SensorType,
    payload: Bytes,
}

impl RawBuffer {
    pub fn new(
        frame: u64,
        timestamp: f64,
        transform: Transform,
        sensor_type: SensorType,
        payload: Bytes,
    ) -> Self {
        Self {
            frame,
            timestamp,
            transform,
            sensor_type,
            payload,
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn payload_bytes(&self) -> &Bytes {
        &self.payload
    }

    /// Encode as header + payload, header little-endian
    pub fn encode(&self) -> Bytes {
        let l = self.transform.location;
        let r = self.transform.rotation;
        let header = RawHeader {
            frame: self.frame.to_le(),
            timestamp: f64_to_le(self.timestamp),
            transform: [l.x, l.y, l.z, r.pitch, r.yaw, r.roll].map(f64_to_le),
            sensor_tag: self.sensor_type.tag().to_le(),
            _reserved: 0,
        };

        let mut buf = BytesMut::with_capacity(RAW_HEADER_SIZE + self.payload.len());
        buf.put_slice(bytemuck::bytes_of(&header));
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decode a buffer produced by [`RawBuffer::encode`]
    ///
    /// # Errors
    /// - Buffer shorter than the header
    /// - Unknown sensor type tag
    pub fn decode(bytes: Bytes) -> Result<Self, ContractError> {
        if bytes.len() < RAW_HEADER_SIZE {
            return Err(ContractError::payload_parse(
                "",
                format!(
                    "raw buffer too short: {} bytes, header needs {}",
                    bytes.len(),
                    RAW_HEADER_SIZE
                ),
            ));
        }

        let header: RawHeader = bytemuck::pod_read_unaligned(&bytes[..RAW_HEADER_SIZE]);
        let tag = u32::from_le(header.sensor_tag);
        let sensor_type = SensorType::from_tag(tag).ok_or_else(|| {
            ContractError::payload_parse("", format!("unknown sensor type tag {tag}"))
        })?;
        let [x, y, z, pitch, yaw, roll] = header.transform.map(f64_from_le);

        Ok(Self {
            frame: u64::from_le(header.frame),
            timestamp: f64_from_le(header.timestamp),
            transform: Transform::new(Location::new(x, y, z), Rotation::new(pitch, yaw, roll)),
            sensor_type,
            payload: bytes.slice(RAW_HEADER_SIZE..),
        })
    }
}

impl RawData for RawBuffer {
    fn frame_number(&self) -> u64 {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn sensor_transform(&self) -> Transform {
        self.transform
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}
