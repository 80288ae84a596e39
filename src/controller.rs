//! Alarm controller: the rules engine of the security system.
//!
//! The controller receives three kinds of events (arming changes, sensor
//! activation changes and camera classification results), decides what the
//! alarm status must become and tells registered listeners about it.
//!
//! ## Rules
//!
//! | Event                              | Effect                                         |
//! |------------------------------------|------------------------------------------------|
//! | disarm                             | `NoAlarm`, cat detection cleared               |
//! | arm (home or away)                 | all sensors inactive                           |
//! | arm home while a cat was seen      | `Alarm`                                        |
//! | sensor activated while armed       | `NoAlarm -> PendingAlarm -> Alarm`             |
//! | active sensor re-activated         | `PendingAlarm -> Alarm`                        |
//! | sensor deactivated                 | `Alarm -> PendingAlarm`, pending + all clear -> `NoAlarm` |
//! | cat seen while armed home          | `Alarm`                                        |
//! | no cat and no active sensor        | `NoAlarm`                                      |
//!
//! ## Locking
//!
//! All durable state lives in the [`StateStore`] which, together with the
//! transient cat-detection flag, sits behind one mutex per controller.
//! Listener callbacks are collected while the lock is held and delivered
//! after it is released but before the operation returns, so a listener may
//! call back into the controller. A second, reentrant delivery lock is held
//! from the state change until its callbacks have run, so listeners see
//! operations in the order they were applied to the store. Image
//! classification runs without either lock held.

use crate::image::{CameraImage, ImageClassifier, TARGET_CONFIDENCE_THRESHOLD};
use crate::listener::{StatusEvent, StatusListener, StatusNotifier};
use crate::sensors::Sensor;
use crate::status::{AlarmStatus, ArmingStatus};
use crate::store::StateStore;
use log::{debug, info};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;

/// State guarded by the controller lock.
struct ControllerState {
    store: Box<dyn StateStore>,
    cat_detected: bool,
    /// Listener notifications produced by the current operation.
    events: Vec<StatusEvent>,
}

impl ControllerState {
    fn set_alarm_status(&mut self, status: AlarmStatus) {
        let previous = self.store.alarm_status();
        self.store.set_alarm_status(status);
        if previous != status {
            info!("Alarm status {} -> {}", previous, status);
        }
        self.events.push(StatusEvent::AlarmStatusChanged(status));
    }

    fn set_arming_status(&mut self, mode: ArmingStatus) {
        if mode == ArmingStatus::Disarmed {
            self.set_alarm_status(AlarmStatus::NoAlarm);
            self.cat_detected = false;
        } else {
            for mut sensor in self.store.sensors() {
                if sensor.is_active() {
                    debug!("Arming resets sensor {}", sensor.name());
                    sensor.set_active(false);
                    self.store.update_sensor(&sensor);
                }
            }

            if mode == ArmingStatus::ArmedHome && self.cat_detected {
                self.set_alarm_status(AlarmStatus::Alarm);
            }
        }
        self.store.set_arming_status(mode);
        info!("Arming status set to {}", mode);
    }

    fn on_cat_detection_result(&mut self, cat: bool) {
        self.cat_detected = cat;

        if cat && self.store.arming_status() == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm);
        } else if !cat && !self.store.any_sensor_active() {
            self.set_alarm_status(AlarmStatus::NoAlarm);
        }
        // A cat while disarmed or armed away changes nothing by itself.

        self.events.push(StatusEvent::CatDetected(cat));
    }

    fn on_sensor_activated(&mut self) {
        if !self.store.arming_status().is_armed() {
            return;
        }
        match self.store.alarm_status() {
            AlarmStatus::NoAlarm => self.set_alarm_status(AlarmStatus::PendingAlarm),
            AlarmStatus::PendingAlarm => self.set_alarm_status(AlarmStatus::Alarm),
            AlarmStatus::Alarm => {}
        }
    }

    fn on_sensor_deactivated(&mut self) {
        match self.store.alarm_status() {
            AlarmStatus::PendingAlarm => {
                if !self.store.any_sensor_active() {
                    self.set_alarm_status(AlarmStatus::NoAlarm);
                }
            }
            AlarmStatus::Alarm => self.set_alarm_status(AlarmStatus::PendingAlarm),
            AlarmStatus::NoAlarm => {}
        }
    }

    fn change_sensor_activation(&mut self, sensor: &mut Sensor, active: bool) {
        let prior_status = self.store.alarm_status();
        // The caller's copy may predate an arming reset.
        let was_active = self
            .store
            .sensor(&sensor.key())
            .map_or(sensor.is_active(), |stored| stored.is_active());

        match (was_active, active) {
            (false, true) => self.on_sensor_activated(),
            (true, false) => self.on_sensor_deactivated(),
            (true, true) => {
                if prior_status == AlarmStatus::PendingAlarm {
                    self.set_alarm_status(AlarmStatus::Alarm);
                }
            }
            (false, false) => {}
        }

        sensor.set_active(active);
        self.store.update_sensor(sensor);
        debug!(
            "Sensor {} ({}) is now {}",
            sensor.name(),
            sensor.sensor_type(),
            if active { "active" } else { "inactive" }
        );

        // Also covers deactivating a sensor that was already inactive.
        if prior_status == AlarmStatus::PendingAlarm
            && !active
            && !self.store.any_sensor_active()
        {
            self.set_alarm_status(AlarmStatus::NoAlarm);
        }
    }
}

/// Security system controller.
///
/// Owns the state store, the image classifier and the listener set. Safe to
/// share between threads behind an `Arc`.
pub struct AlarmController {
    state: Mutex<ControllerState>,
    /// Serializes notification delivery across operations.
    delivery: ReentrantMutex<()>,
    classifier: Arc<dyn ImageClassifier>,
    notifier: StatusNotifier,
}

impl AlarmController {
    pub fn new(store: Box<dyn StateStore>, classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            state: Mutex::new(ControllerState {
                store,
                cat_detected: false,
                events: Vec::new(),
            }),
            delivery: ReentrantMutex::new(()),
            classifier,
            notifier: StatusNotifier::new(),
        }
    }

    /// Run `f` under the state lock, then deliver the notifications it
    /// produced before any later operation can deliver its own.
    fn with_state<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let _delivery = self.delivery.lock();
        let (result, events) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.events))
        };
        self.notifier.dispatch(&events);
        result
    }

    /// Change the arming mode.
    ///
    /// Disarming clears the alarm and the cat detection. Arming resets all
    /// sensors to inactive, and arming home while a cat was last seen raises
    /// the alarm.
    pub fn set_arming_status(&self, mode: ArmingStatus) {
        self.with_state(|state| state.set_arming_status(mode));
    }

    /// Classify a camera image and apply the cat-detection rules.
    ///
    /// Classification may be slow and runs without holding the controller
    /// lock. Listeners always receive the classification result, whether or
    /// not the alarm status changed.
    pub fn process_image(&self, image: &CameraImage) -> bool {
        let cat = self
            .classifier
            .contains_target(image, TARGET_CONFIDENCE_THRESHOLD);
        info!(
            "Image classified: {}",
            if cat { "cat detected" } else { "no cat" }
        );
        self.with_state(|state| state.on_cat_detection_result(cat));
        cat
    }

    /// Change a sensor's activation and update the alarm status.
    ///
    /// `sensor` is updated in place and then persisted. Rules are evaluated
    /// against the stored sensor state and alarm status from before the call;
    /// the `active` flag of `sensor` itself is only used for sensors the
    /// store does not know.
    pub fn change_sensor_activation(&self, sensor: &mut Sensor, active: bool) {
        self.with_state(|state| state.change_sensor_activation(sensor, active));
    }

    /// Persist the alarm status and notify every listener.
    pub fn set_alarm_status(&self, status: AlarmStatus) {
        self.with_state(|state| state.set_alarm_status(status));
    }

    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) {
        self.notifier.add(listener);
    }

    pub fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>) {
        self.notifier.remove(listener);
    }

    pub fn alarm_status(&self) -> AlarmStatus {
        self.state.lock().store.alarm_status()
    }

    pub fn arming_status(&self) -> ArmingStatus {
        self.state.lock().store.arming_status()
    }

    pub fn sensors(&self) -> Vec<Sensor> {
        self.state.lock().store.sensors()
    }

    pub fn add_sensor(&self, sensor: Sensor) {
        self.state.lock().store.add_sensor(sensor);
    }

    pub fn remove_sensor(&self, sensor: &Sensor) {
        self.state.lock().store.remove_sensor(sensor);
    }

    /// Whether the last classified image contained a cat.
    pub fn is_cat_detected(&self) -> bool {
        self.state.lock().cat_detected
    }
}
