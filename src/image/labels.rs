//! Label based target classification.
//!
//! A [`LabelDetector`] is the recognition backend: given an image it returns
//! the labels it sees with their confidence. [`LabelClassifier`] turns those
//! labels into the yes/no answer the controller needs.

use super::{CameraImage, ImageClassifier};
use crate::error::{AlarmError, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A label reported by a detector, with confidence in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Recognition backend returning labels for an image.
pub trait LabelDetector: Send + Sync {
    /// Detect labels with at least `min_confidence` percent confidence.
    fn detect_labels(&self, image: &CameraImage, min_confidence: f32) -> Result<Vec<Label>>;
}

/// Classifier that reports a target when a detected label names it.
///
/// Label names match case-insensitively on substring, so a target of `cat`
/// also matches labels like `Cat` or `Wildcat`.
pub struct LabelClassifier<D> {
    detector: Option<D>,
    target: String,
}

impl<D: LabelDetector> LabelClassifier<D> {
    pub fn new(detector: D, target: impl Into<String>) -> Self {
        Self {
            detector: Some(detector),
            target: target.into().to_lowercase(),
        }
    }

    /// A classifier without a backend. Every image is reported as clear.
    pub fn unconfigured(target: impl Into<String>) -> Self {
        Self {
            detector: None,
            target: target.into().to_lowercase(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn log_labels(labels: &[Label]) {
        let summary = labels
            .iter()
            .map(|l| format!("{}({:.1}%)", l.name, l.confidence))
            .collect::<Vec<_>>()
            .join(", ");
        info!("[Labels] {}", summary);
    }
}

impl<D: LabelDetector> ImageClassifier for LabelClassifier<D> {
    fn contains_target(&self, image: &CameraImage, confidence_threshold: f32) -> bool {
        let Some(detector) = self.detector.as_ref() else {
            error!("Label detector not configured");
            return false;
        };

        match detector.detect_labels(image, confidence_threshold) {
            Ok(labels) => {
                Self::log_labels(&labels);
                labels.iter().any(|l| {
                    l.confidence >= confidence_threshold
                        && l.name.to_lowercase().contains(&self.target)
                })
            }
            Err(e) => {
                error!("Error detecting labels: {}", e);
                false
            }
        }
    }
}

/// Detector that reads precomputed labels stored next to the image.
///
/// For an image loaded from `frame.jpg` the labels are read from
/// `frame.jpg.labels.json`, a JSON array of `{"name", "confidence"}`
/// objects.
#[derive(Debug, Clone, Default)]
pub struct SidecarLabelDetector;

impl SidecarLabelDetector {
    pub const EXTENSION: &'static str = "labels.json";

    /// Path of the label file belonging to `image`.
    pub fn sidecar_path(image: &CameraImage) -> Option<PathBuf> {
        image.source().map(|source| {
            let mut path = source.as_os_str().to_owned();
            path.push(".");
            path.push(Self::EXTENSION);
            PathBuf::from(path)
        })
    }
}

impl LabelDetector for SidecarLabelDetector {
    fn detect_labels(&self, image: &CameraImage, min_confidence: f32) -> Result<Vec<Label>> {
        let path = Self::sidecar_path(image).ok_or_else(|| {
            AlarmError::ImageSource("image has no source file for label lookup".to_string())
        })?;
        let bytes = fs::read(&path)
            .map_err(|e| AlarmError::LabelDetection(format!("{}: {}", path.display(), e)))?;
        let labels: Vec<Label> = serde_json::from_slice(&bytes)?;
        Ok(labels
            .into_iter()
            .filter(|l| l.confidence >= min_confidence)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticDetector(Vec<Label>);

    impl LabelDetector for StaticDetector {
        fn detect_labels(&self, _image: &CameraImage, _min: f32) -> Result<Vec<Label>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl LabelDetector for FailingDetector {
        fn detect_labels(&self, _image: &CameraImage, _min: f32) -> Result<Vec<Label>> {
            Err(AlarmError::LabelDetection("backend unreachable".to_string()))
        }
    }

    fn image() -> CameraImage {
        CameraImage::from_bytes(vec![0u8; 8])
    }

    #[test]
    fn test_matching_label_is_target() {
        let classifier = LabelClassifier::new(
            StaticDetector(vec![Label::new("Animal", 99.0), Label::new("Cat", 92.3)]),
            "cat",
        );
        assert!(classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let classifier = LabelClassifier::new(StaticDetector(vec![Label::new("WildCat", 70.0)]), "CAT");
        assert_eq!(classifier.target(), "cat");
        assert!(classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_low_confidence_label_is_ignored() {
        let classifier = LabelClassifier::new(StaticDetector(vec![Label::new("Cat", 30.0)]), "cat");
        assert!(!classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_no_matching_label() {
        let classifier = LabelClassifier::new(
            StaticDetector(vec![Label::new("Dog", 95.0), Label::new("Sofa", 80.0)]),
            "cat",
        );
        assert!(!classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_detector_error_means_no_target() {
        let classifier = LabelClassifier::new(FailingDetector, "cat");
        assert!(!classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_unconfigured_means_no_target() {
        let classifier = LabelClassifier::<SidecarLabelDetector>::unconfigured("cat");
        assert!(!classifier.contains_target(&image(), 50.0));
    }

    #[test]
    fn test_sidecar_labels_are_read_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame.jpg");
        fs::write(&frame, [0u8; 4]).unwrap();
        fs::write(
            dir.path().join("frame.jpg.labels.json"),
            r#"[{"name": "Cat", "confidence": 88.0}, {"name": "Plant", "confidence": 12.5}]"#,
        )
        .unwrap();

        let image = CameraImage::load(&frame).unwrap();
        let labels = SidecarLabelDetector.detect_labels(&image, 50.0).unwrap();
        assert_eq!(labels, vec![Label::new("Cat", 88.0)]);

        let classifier = LabelClassifier::new(SidecarLabelDetector, "cat");
        assert!(classifier.contains_target(&image, 50.0));
    }

    #[test]
    fn test_sidecar_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame.jpg");
        fs::write(&frame, [0u8; 4]).unwrap();

        let image = CameraImage::load(&frame).unwrap();
        let err = SidecarLabelDetector.detect_labels(&image, 50.0).unwrap_err();
        assert!(matches!(err, AlarmError::LabelDetection(_)));
    }

    #[test]
    fn test_sidecar_needs_source_path() {
        let err = SidecarLabelDetector
            .detect_labels(&image(), 50.0)
            .unwrap_err();
        assert!(matches!(err, AlarmError::ImageSource(_)));
    }
}
