//! Random classifier for development without a recognition backend.

use super::{CameraImage, ImageClassifier};
use log::debug;
use rand::Rng;

/// Reports a target at random with a fixed probability.
pub struct FakeImageClassifier {
    detection_rate: f64,
}

impl FakeImageClassifier {
    /// Create a classifier that reports a target with `detection_rate`
    /// probability. The rate is clamped to `[0, 1]`.
    pub fn new(detection_rate: f64) -> Self {
        let detection_rate = if detection_rate.is_nan() {
            0.0
        } else {
            detection_rate.clamp(0.0, 1.0)
        };
        Self { detection_rate }
    }

    pub fn detection_rate(&self) -> f64 {
        self.detection_rate
    }
}

impl Default for FakeImageClassifier {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ImageClassifier for FakeImageClassifier {
    fn contains_target(&self, image: &CameraImage, confidence_threshold: f32) -> bool {
        let detected = rand::thread_rng().gen_bool(self.detection_rate);
        debug!(
            "[Fake] {} byte image, threshold {:.1}% -> {}",
            image.bytes().len(),
            confidence_threshold,
            detected
        );
        detected
    }
}
