//! Sensor data error types

use contracts::{ContractError, SensorType};
use thiserror::Error;

/// Sensor data error
#[derive(Debug, Error)]
pub enum SensorDataError {
    /// Payload bytes do not decode into the expected layout
    #[error("failed to decode {sensor_type} payload: {message}")]
    PayloadDecode {
        /// Sensor type from the raw header
        sensor_type: SensorType,
        /// Decoder message
        message: String,
    },

    /// Payload could not be encoded
    #[error("failed to encode {sensor_type} payload: {message}")]
    PayloadEncode {
        /// Sensor type being encoded
        sensor_type: SensorType,
        /// Encoder message
        message: String,
    },

    /// Raw buffer header error
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Sensor data Result alias
pub type Result<T> = std::result::Result<T, SensorDataError>;
