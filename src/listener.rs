//! Status listeners for alarm and cat-detection updates.
//!
//! The presentation layer registers [`StatusListener`]s with the controller.
//! Whenever the alarm status is set or an image has been classified, every
//! registered listener is called synchronously before the controller
//! operation returns.

use crate::status::AlarmStatus;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receives alarm status and cat-detection updates from the controller.
pub trait StatusListener: Send + Sync {
    /// Called every time the alarm status is set, even if it did not change.
    fn on_alarm_status_changed(&self, status: AlarmStatus);

    /// Called once per processed image with the classification result.
    fn on_cat_detected(&self, detected: bool);
}

/// A single update to deliver to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    AlarmStatusChanged(AlarmStatus),
    CatDetected(bool),
}

/// Set of registered listeners with fan-out delivery.
///
/// Listeners are identified by their `Arc` allocation, so registering the
/// same handle twice keeps a single entry. Delivery works on a snapshot of
/// the set, which lets a listener add or remove listeners from inside a
/// callback without deadlocking.
#[derive(Default)]
pub struct StatusNotifier {
    listeners: RwLock<Vec<Arc<dyn StatusListener>>>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add(&self, listener: Arc<dyn StatusListener>) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn StatusListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Deliver events in order to every registered listener.
    pub fn dispatch(&self, events: &[StatusEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.read().clone();
        for event in events {
            for listener in &listeners {
                match *event {
                    StatusEvent::AlarmStatusChanged(status) => {
                        listener.on_alarm_status_changed(status)
                    }
                    StatusEvent::CatDetected(detected) => listener.on_cat_detected(detected),
                }
            }
        }
    }
}

fn same_listener(a: &Arc<dyn StatusListener>, b: &Arc<dyn StatusListener>) -> bool {
    // Compare allocations only; vtable pointers are not guaranteed unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Listener that writes every update to the log.
pub struct LogListener;

impl StatusListener for LogListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        info!("[Alarm] Status: {} ({})", status, status.description());
    }

    fn on_cat_detected(&self, detected: bool) {
        if detected {
            info!("[Camera] DANGER - CAT DETECTED");
        } else {
            info!("[Camera] Camera clear, no cats");
        }
    }
}
