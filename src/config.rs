use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Application configuration. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub messaging: MessagingConfig,
    pub view_model: ViewModelConfig,
    /// One of `error`, `warn`, `info`, `debug`, `trace`. Defaults to `warn`.
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn log_level(&self) -> Result<Option<log::Level>, ConfigError> {
        self.log_level.as_deref()
            .map(|level| level.parse().map_err(|_| ConfigError::LogLevel(level.to_string())))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// String resource holding the push sender id.
    pub sender_id_resource: String,
    /// Wait before handing a launch notification to an already registered callback.
    /// Zero defers to the next scheduler turn.
    pub launch_delivery_delay_ms: u64,
    /// First platform API level that can report whether notifications are enabled.
    pub notification_query_min_sdk: u32,
}

impl MessagingConfig {
    pub fn launch_delivery_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delivery_delay_ms)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        MessagingConfig{
            sender_id_resource: "gcm_defaultSenderId".to_string(),
            launch_delivery_delay_ms: 0,
            notification_query_min_sdk: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewModelConfig {
    /// Delay between receiving a push message and alerting it.
    pub message_alert_delay_ms: u64,
    pub demo_topic: String,
}

impl ViewModelConfig {
    pub fn message_alert_delay(&self) -> Duration {
        Duration::from_millis(self.message_alert_delay_ms)
    }
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        ViewModelConfig{message_alert_delay_ms: 500, demo_topic: "demo".to_string()}
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
