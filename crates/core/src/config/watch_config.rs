use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::retry_settings::RetrySettings;
use crate::config::{load_json, ConfigError};
use crate::pipeline::playback_use_case::PlaybackSettings;
use crate::shared::constants::{DEFAULT_CANCEL_POLL_MS, DEFAULT_READ_ATTEMPTS};
use crate::shared::crop_window::CropWindow;

/// Configuration of `framepoll watch`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub crop: Option<CropWindow>,
    /// Keep only this channel of each (cropped) frame.
    pub channel: Option<u8>,
    /// Write shown frames here as PNG files; log them when unset.
    pub output_dir: Option<PathBuf>,
    pub open_retry: RetrySettings,
    pub read_retry: RetrySettings,
    pub cancel_poll_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            crop: None,
            channel: None,
            output_dir: None,
            open_retry: RetrySettings::default(),
            read_retry: RetrySettings::bounded(DEFAULT_READ_ATTEMPTS),
            cancel_poll_ms: DEFAULT_CANCEL_POLL_MS,
        }
    }
}

impl WatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(crop) = &self.crop {
            if crop.width == 0 || crop.height == 0 {
                return Err(ConfigError::invalid(
                    "crop",
                    format!("size must be non-zero, got {}x{}", crop.width, crop.height),
                ));
            }
        }
        if let Some(channel) = self.channel {
            if channel > 2 {
                return Err(ConfigError::invalid(
                    "channel",
                    format!("must be 0, 1 or 2, got {channel}"),
                ));
            }
        }
        if self.cancel_poll_ms == 0 {
            return Err(ConfigError::invalid("cancel_poll_ms", "must be at least 1"));
        }
        self.open_retry.validate("open_retry")?;
        self.read_retry.validate("read_retry")
    }

    /// Validates and converts into playback settings.
    pub fn to_settings(&self) -> Result<PlaybackSettings, ConfigError> {
        self.validate()?;
        Ok(PlaybackSettings {
            crop: self.crop,
            channel: self.channel,
            open_policy: self.open_retry.to_policy(),
            read_policy: self.read_retry.to_policy(),
            cancel_poll: Duration::from_millis(self.cancel_poll_ms),
        })
    }
}
