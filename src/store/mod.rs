//! Persistence collaborators for the alarm controller.
//!
//! The controller never touches storage directly. It reads and writes the
//! arming mode, alarm status and sensors through [`StateStore`]. Stores are
//! expected to succeed; anything that goes wrong while persisting is logged
//! by the store itself.

pub mod json_file;
pub mod lock;
pub mod memory;

pub use json_file::JsonFileStateStore;
pub use lock::{StoreLock, StoreLockError};
pub use memory::MemoryStateStore;

use crate::sensors::{Sensor, SensorKey};
use crate::status::{AlarmStatus, ArmingStatus};

/// Storage for the durable alarm state.
pub trait StateStore: Send {
    fn arming_status(&self) -> ArmingStatus;

    fn set_arming_status(&mut self, status: ArmingStatus);

    fn alarm_status(&self) -> AlarmStatus;

    fn set_alarm_status(&mut self, status: AlarmStatus);

    /// All known sensors, ordered by name then type.
    fn sensors(&self) -> Vec<Sensor>;

    /// The stored copy of the sensor with identity `key`, if known.
    fn sensor(&self, key: &SensorKey) -> Option<Sensor> {
        self.sensors().into_iter().find(|s| &s.key() == key)
    }

    fn add_sensor(&mut self, sensor: Sensor);

    fn remove_sensor(&mut self, sensor: &Sensor);

    /// Replace the stored state of a known sensor.
    fn update_sensor(&mut self, sensor: &Sensor);

    /// Whether any stored sensor is currently active.
    fn any_sensor_active(&self) -> bool {
        self.sensors().iter().any(Sensor::is_active)
    }
}
