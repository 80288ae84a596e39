use crate::sensors::SensorType;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AlarmError {
    #[error("Unknown sensor: {name} ({sensor_type})")]
    UnknownSensor {
        name: String,
        sensor_type: SensorType,
    },

    #[error("Sensor already exists: {name} ({sensor_type})")]
    DuplicateSensor {
        name: String,
        sensor_type: SensorType,
    },

    #[error("Image source unavailable: {0}")]
    ImageSource(String),

    #[error("Label detection failed: {0}")]
    LabelDetection(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AlarmError>;
