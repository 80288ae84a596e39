//! Sensor model for the alarm controller.
//!
//! Sensors are binary devices (door, window, motion) identified by their
//! name and type. The controller flips their `active` flag and hands them
//! back to the state store for persistence.

pub mod sensor;

pub use sensor::{Sensor, SensorKey, SensorType};
