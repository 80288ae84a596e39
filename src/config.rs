use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

/// Load environment variables from the given file. Variables that are
/// already set keep their value.
pub fn load_dotenv_from(path: &Path) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split a `KEY=VALUE` line. Comments, blank lines and lines without `=`
/// yield `None`. Matching surrounding quotes are stripped from the value.
pub fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    Some((key, value))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding arming mode, alarm status and sensors.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub classifier: ClassifierKind,
    /// Label substring treated as the monitored target.
    pub target_label: String,
    /// Probability that the fake classifier reports a target.
    pub fake_detection_rate: f64,
}

/// Which image classifier backs `process_image`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClassifierKind {
    /// Random answers, no backend needed.
    #[default]
    Fake,
    /// Labels read from `<image>.labels.json` next to each image.
    Labels,
    /// No detection backend. Every image is reported as clear.
    Disabled,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: default_store_path(),
            },
            camera: CameraConfig {
                classifier: ClassifierKind::default(),
                target_label: "cat".to_string(),
                fake_detection_rate: 0.5,
            },
        }
    }
}

/// `<data dir>/catpoint/state.json`, or `./catpoint-state.json` when the
/// platform has no data directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("catpoint").join("state.json"))
        .unwrap_or_else(|| PathBuf::from("catpoint-state.json"))
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    /// Unparseable values are ignored and keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CATPOINT_STORE_PATH") {
            config.store.path = PathBuf::from(path);
        }
        if let Some(kind) = lookup("CATPOINT_CLASSIFIER") {
            match kind.parse() {
                Ok(k) => config.camera.classifier = k,
                Err(_) => log::warn!("Unknown CATPOINT_CLASSIFIER '{}', using default", kind),
            }
        }
        if let Some(label) = lookup("CATPOINT_TARGET_LABEL")
            && !label.trim().is_empty()
        {
            config.camera.target_label = label.trim().to_string();
        }
        if let Some(rate) = lookup("CATPOINT_FAKE_DETECTION_RATE")
            && let Ok(r) = rate.parse::<f64>()
        {
            config.camera.fake_detection_rate = r.clamp(0.0, 1.0);
        }

        config
    }
}
