//! Sensor simulation for testing.
//!
//! Provides simulated sensor activity against a live controller for
//! development and demos.

use crate::controller::AlarmController;
use log::info;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Flip the activation of one randomly chosen sensor.
///
/// Returns the sensor name and its new state, or `None` when the controller
/// has no sensors.
pub fn toggle_random_sensor(controller: &AlarmController) -> Option<(String, bool)> {
    let sensors = controller.sensors();
    let mut sensor = sensors.choose(&mut rand::thread_rng())?.clone();
    let active = !sensor.is_active();
    controller.change_sensor_activation(&mut sensor, active);
    Some((sensor.name().to_string(), active))
}

/// Spawn a task that periodically toggles a random sensor.
///
/// Runs `ticks` times, or forever when `ticks` is `None`.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_sensor_simulation(
    controller: Arc<AlarmController>,
    period: Duration,
    ticks: Option<u64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        let mut done = 0u64;
        while ticks.is_none_or(|t| done < t) {
            interval.tick().await;
            done += 1;
            match toggle_random_sensor(&controller) {
                Some((name, active)) => info!(
                    "[Sim] {} {} -> alarm {}",
                    name,
                    if active { "activated" } else { "deactivated" },
                    controller.alarm_status()
                ),
                None => info!("[Sim] No sensors to toggle"),
            }
        }
    })
}
