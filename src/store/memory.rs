//! In-memory state store.

use super::StateStore;
use crate::sensors::{Sensor, SensorKey};
use crate::status::{AlarmStatus, ArmingStatus};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of everything a store keeps.
///
/// Also the on-disk layout of [`super::JsonFileStateStore`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub arming_status: ArmingStatus,
    #[serde(default)]
    pub alarm_status: AlarmStatus,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

/// Keeps the alarm state in process memory.
///
/// Starts disarmed with no alarm and no sensors.
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStore {
    arming_status: ArmingStatus,
    alarm_status: AlarmStatus,
    sensors: BTreeMap<SensorKey, Sensor>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot. Duplicate sensors keep the last entry.
    pub fn from_snapshot(state: PersistedState) -> Self {
        Self {
            arming_status: state.arming_status,
            alarm_status: state.alarm_status,
            sensors: state.sensors.into_iter().map(|s| (s.key(), s)).collect(),
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            arming_status: self.arming_status,
            alarm_status: self.alarm_status,
            sensors: self.sensors(),
        }
    }

    /// Builder-style sensor registration, handy for setting up a store.
    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.add_sensor(sensor);
        self
    }
}

impl StateStore for MemoryStateStore {
    fn arming_status(&self) -> ArmingStatus {
        self.arming_status
    }

    fn set_arming_status(&mut self, status: ArmingStatus) {
        self.arming_status = status;
    }

    fn alarm_status(&self) -> AlarmStatus {
        self.alarm_status
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) {
        self.alarm_status = status;
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.values().cloned().collect()
    }

    fn sensor(&self, key: &SensorKey) -> Option<Sensor> {
        self.sensors.get(key).cloned()
    }

    fn add_sensor(&mut self, sensor: Sensor) {
        self.sensors.insert(sensor.key(), sensor);
    }

    fn remove_sensor(&mut self, sensor: &Sensor) {
        self.sensors.remove(&sensor.key());
    }

    fn update_sensor(&mut self, sensor: &Sensor) {
        match self.sensors.get_mut(&sensor.key()) {
            Some(stored) => *stored = sensor.clone(),
            None => warn!(
                "Ignoring update for unknown sensor {} ({})",
                sensor.name(),
                sensor.sensor_type()
            ),
        }
    }

    fn any_sensor_active(&self) -> bool {
        self.sensors.values().any(Sensor::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorType;

    #[test]
    fn test_defaults() {
        let store = MemoryStateStore::new();
        assert_eq!(store.arming_status(), ArmingStatus::Disarmed);
        assert_eq!(store.alarm_status(), AlarmStatus::NoAlarm);
        assert!(store.sensors().is_empty());
        assert!(!store.any_sensor_active());
    }

    #[test]
    fn test_sensors_are_listed_by_name() {
        let store = MemoryStateStore::new()
            .with_sensor(Sensor::new("Window", SensorType::Window))
            .with_sensor(Sensor::new("Door", SensorType::Door));

        let names: Vec<_> = store.sensors().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["Door", "Window"]);
    }

    #[test]
    fn test_add_same_identity_replaces() {
        let mut active = Sensor::new("Door", SensorType::Door);
        active.set_active(true);
        let store = MemoryStateStore::new()
            .with_sensor(Sensor::new("Door", SensorType::Door))
            .with_sensor(active);

        assert_eq!(store.sensors().len(), 1);
        assert!(store.any_sensor_active());
    }

    #[test]
    fn test_update_known_sensor() {
        let mut store = MemoryStateStore::new().with_sensor(Sensor::new("Hall", SensorType::Motion));
        let mut sensor = Sensor::new("Hall", SensorType::Motion);
        sensor.set_active(true);

        store.update_sensor(&sensor);
        assert!(store.sensors()[0].is_active());
    }

    #[test]
    fn test_lookup_by_key_returns_stored_state() {
        let mut stored = Sensor::new("Hall", SensorType::Motion);
        stored.set_active(true);
        let store = MemoryStateStore::new().with_sensor(stored.clone());

        let stale = Sensor::new("Hall", SensorType::Motion);
        assert_eq!(store.sensor(&stale.key()), Some(stored));
        assert_eq!(store.sensor(&Sensor::new("Hall", SensorType::Door).key()), None);
    }

    #[test]
    fn test_update_unknown_sensor_is_ignored() {
        let mut store = MemoryStateStore::new();
        let mut sensor = Sensor::new("Ghost", SensorType::Door);
        sensor.set_active(true);

        store.update_sensor(&sensor);
        assert!(store.sensors().is_empty());
    }

    #[test]
    fn test_remove_matches_identity_not_state() {
        let mut store = MemoryStateStore::new().with_sensor(Sensor::new("Hall", SensorType::Motion));
        let mut handle = Sensor::new("Hall", SensorType::Motion);
        handle.set_active(true);

        store.remove_sensor(&handle);
        assert!(store.sensors().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = MemoryStateStore::new().with_sensor(Sensor::new("Door", SensorType::Door));
        store.set_arming_status(ArmingStatus::ArmedAway);
        store.set_alarm_status(AlarmStatus::PendingAlarm);

        let restored = MemoryStateStore::from_snapshot(store.snapshot());
        assert_eq!(restored.snapshot(), store.snapshot());
    }
}
