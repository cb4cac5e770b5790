use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::reader::domain::retry_policy::RetryPolicy;
use crate::shared::constants::{
    DEFAULT_MAX_RETRY_INTERVAL_MS, DEFAULT_OPEN_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS,
};

/// Serializable form of a [`RetryPolicy`].
///
/// `max_attempts: null` polls forever at a fixed `interval_ms`; a number
/// selects exponential backoff from `interval_ms` up to `max_interval_ms`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_attempts: Option<u32>,
}

impl RetrySettings {
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_interval_ms: DEFAULT_MAX_RETRY_INTERVAL_MS,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn to_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.interval_ms);
        match self.max_attempts {
            None => RetryPolicy::fixed(initial),
            Some(max) => {
                RetryPolicy::bounded_exponential(max, initial, Duration::from_millis(self.max_interval_ms))
            }
        }
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        self.to_policy()
            .validate()
            .map_err(|reason| ConfigError::invalid(field, reason))
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::bounded(DEFAULT_OPEN_ATTEMPTS)
    }
}
