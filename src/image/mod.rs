//! Camera images and target classification.
//!
//! The controller only asks one question of a camera frame: does it contain
//! the monitored target (a cat)? Classifiers answer with a plain `bool` and
//! never fail; a backend that is unreachable or unconfigured answers `false`.
//!
//! Available classifiers:
//! - [`FakeImageClassifier`]: random answers for development
//! - [`LabelClassifier`]: matches labels reported by a [`LabelDetector`]

pub mod fake;
pub mod labels;

pub use fake::FakeImageClassifier;
pub use labels::{Label, LabelClassifier, LabelDetector, SidecarLabelDetector};

use crate::config::{CameraConfig, ClassifierKind};
use crate::error::{AlarmError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Minimum confidence (percent) the controller asks classifiers for.
pub const TARGET_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// An encoded camera frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraImage {
    bytes: Vec<u8>,
    source: Option<PathBuf>,
}

impl CameraImage {
    /// Wrap already encoded image bytes that have no file behind them.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            source: None,
        }
    }

    /// Read an image file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| AlarmError::ImageSource(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            bytes,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File the image was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Decides whether an image contains the monitored target.
pub trait ImageClassifier: Send + Sync {
    /// Returns `true` if the target is present with at least
    /// `confidence_threshold` percent confidence. Failures answer `false`.
    fn contains_target(&self, image: &CameraImage, confidence_threshold: f32) -> bool;
}

/// Build the classifier selected by the camera configuration.
pub fn classifier_from_config(config: &CameraConfig) -> Arc<dyn ImageClassifier> {
    match config.classifier {
        ClassifierKind::Fake => Arc::new(FakeImageClassifier::new(config.fake_detection_rate)),
        ClassifierKind::Labels => Arc::new(LabelClassifier::new(
            SidecarLabelDetector,
            config.target_label.clone(),
        )),
        ClassifierKind::Disabled => Arc::new(LabelClassifier::<SidecarLabelDetector>::unconfigured(
            config.target_label.clone(),
        )),
    }
}
