use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::retry_settings::RetrySettings;
use crate::config::{load_json, ConfigError};
use crate::detection::domain::export_format::ExportFormat;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_MODEL_NAME, DEFAULT_READ_ATTEMPTS};

/// Configuration of `framepoll detect`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Model file path, or a file name looked up in the model cache.
    pub model: String,
    /// Where to download the model from when it is not found locally.
    pub model_url: Option<String>,
    pub output_dir: PathBuf,
    pub confidence: f64,
    pub export: Option<ExportFormat>,
    pub open_retry: RetrySettings,
    pub read_retry: RetrySettings,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_NAME.to_string(),
            model_url: None,
            output_dir: PathBuf::from("detections"),
            confidence: DEFAULT_CONFIDENCE,
            export: None,
            open_retry: RetrySettings::default(),
            read_retry: RetrySettings::bounded(DEFAULT_READ_ATTEMPTS),
        }
    }
}

impl DetectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::invalid(
                "confidence",
                format!("must be between 0.0 and 1.0, got {}", self.confidence),
            ));
        }
        if let Some(url) = &self.model_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "model_url",
                    format!("must be an http(s) URL, got '{url}'"),
                ));
            }
        }
        self.open_retry.validate("open_retry")?;
        self.read_retry.validate("read_retry")
    }
}
