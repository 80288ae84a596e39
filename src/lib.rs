//! Catpoint alarm library.
//!
//! This library provides the alarm controller of a home security system:
//! it combines sensor activity, the arming mode and camera cat detection
//! into one alarm status and reports changes to registered listeners.

pub mod config;
pub mod controller;
pub mod error;
pub mod image;
pub mod listener;
pub mod sensors;
pub mod simulation;
pub mod status;
pub mod store;

pub use controller::AlarmController;
pub use error::{AlarmError, Result};
pub use listener::{LogListener, StatusListener};
pub use sensors::{Sensor, SensorType};
pub use status::{AlarmStatus, ArmingStatus};
