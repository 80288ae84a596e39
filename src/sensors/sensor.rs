//! Binary sensor entity.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of physical sensor.
///
/// No controller rule depends on the type; it only takes part in the
/// sensor identity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

/// Identity of a sensor: name plus type.
///
/// Ordered by name first so stores list sensors alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorKey {
    pub name: String,
    pub sensor_type: SensorType,
}

/// A door, window or motion sensor and its activation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    name: String,
    sensor_type: SensorType,
    #[serde(default)]
    active: bool,
}

impl Sensor {
    /// Create a new, inactive sensor.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Identity used by stores to find this sensor.
    pub fn key(&self) -> SensorKey {
        SensorKey {
            name: self.name.clone(),
            sensor_type: self.sensor_type,
        }
    }
}
