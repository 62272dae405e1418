//! Configuration for the VaultAlert node.

use crate::core::{
    DEFAULT_FREQUENCY_HZ, DEFAULT_LIGHT_THRESHOLD, DEFAULT_MOTION_THRESHOLD,
    DEFAULT_REPORT_INTERVAL,
};
use crate::transport::{TlsMode, TransportConfig, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default supervisory endpoint (a local functions host).
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:7071/api/collect";

/// Main configuration for the node. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw light level above which the vault counts as open
    pub light_threshold: u16,

    /// Deviation from 1 g above which the vault counts as moved
    pub motion_threshold: f64,

    /// Time between status reports
    #[serde(with = "duration_ms")]
    pub report_interval: Duration,

    /// Time between control loop iterations
    #[serde(with = "duration_ms")]
    pub tick_interval: Duration,

    /// Upper bound on one report request
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,

    /// Buzzer tone
    pub indicator_frequency_hz: u32,

    /// URL status reports are POSTed to
    pub endpoint_url: String,

    /// Network credentials
    pub link: LinkConfig,

    /// Certificate policy for the endpoint
    pub tls: TlsMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            light_threshold: DEFAULT_LIGHT_THRESHOLD,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            report_interval: DEFAULT_REPORT_INTERVAL,
            tick_interval: Duration::from_millis(20),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            indicator_frequency_hz: DEFAULT_FREQUENCY_HZ,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            link: LinkConfig::default(),
            tls: TlsMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vault-alert")
            .join("config.json")
    }

    /// Check values that would make the node misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint_url is empty".to_string()));
        }
        reqwest::Url::parse(&self.endpoint_url)
            .map_err(|e| ConfigError::Invalid(format!("endpoint_url: {e}")))?;
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "motion_threshold must be a non-negative number, got {}",
                self.motion_threshold
            )));
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "report_interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Transport settings derived from this configuration.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(
            self.endpoint_url.clone(),
            self.request_timeout,
            self.tls.clone(),
        )
    }

    /// JSON rendering with secrets masked.
    pub fn redacted_json(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if !shown.link.passphrase.is_empty() {
            shown.link.passphrase = "********".to_string();
        }
        serde_json::to_string_pretty(&shown).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

/// Credentials for the network the node joins.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub ssid: String,
    pub passphrase: String,
}

impl LinkConfig {
    /// Whether a network name has been set.
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

impl std::fmt::Debug for LinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkConfig")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
