//! JSON file backed state store.
//!
//! Keeps the state in memory and rewrites the whole snapshot after every
//! mutation, so the alarm state survives restarts of the CLI.

use super::StateStore;
use super::memory::{MemoryStateStore, PersistedState};
use crate::sensors::{Sensor, SensorKey};
use crate::status::{AlarmStatus, ArmingStatus};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

impl PersistedState {
    /// Load from file. Missing or unreadable files yield the default state.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedState>(&bytes) {
                Ok(state) => {
                    info!(
                        "Loaded alarm state from {:?} ({} sensors)",
                        path,
                        state.sensors.len()
                    );
                    state
                }
                Err(e) => {
                    warn!("Failed to parse state file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No persisted alarm state at {:?} (first run)", path);
                Self::default()
            }
            Err(e) => {
                error!("Failed to read state file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save to file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// State store persisted as a pretty-printed JSON file.
pub struct JsonFileStateStore {
    path: PathBuf,
    state: MemoryStateStore,
}

impl JsonFileStateStore {
    /// Open the store at `path`, loading any existing state.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = MemoryStateStore::from_snapshot(PersistedState::load(&path));
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        if let Err(e) = self.state.snapshot().save(&self.path) {
            error!("Failed to save alarm state to {:?}: {}", self.path, e);
        }
    }
}

impl StateStore for JsonFileStateStore {
    fn arming_status(&self) -> ArmingStatus {
        self.state.arming_status()
    }

    fn set_arming_status(&mut self, status: ArmingStatus) {
        self.state.set_arming_status(status);
        self.persist();
    }

    fn alarm_status(&self) -> AlarmStatus {
        self.state.alarm_status()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) {
        self.state.set_alarm_status(status);
        self.persist();
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.state.sensors()
    }

    fn sensor(&self, key: &SensorKey) -> Option<Sensor> {
        self.state.sensor(key)
    }

    fn add_sensor(&mut self, sensor: Sensor) {
        self.state.add_sensor(sensor);
        self.persist();
    }

    fn remove_sensor(&mut self, sensor: &Sensor) {
        self.state.remove_sensor(sensor);
        self.persist();
    }

    fn update_sensor(&mut self, sensor: &Sensor) {
        self.state.update_sensor(sensor);
        self.persist();
    }

    fn any_sensor_active(&self) -> bool {
        self.state.any_sensor_active()
    }
}
