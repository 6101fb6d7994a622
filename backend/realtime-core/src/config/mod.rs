pub mod params;

pub use params::{ConnectionParams, ConnectionParamsBuilder};

use crate::DEFAULT_ENDPOINT;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "realtime.json";
const CONFIG_VERSION: u32 = 1;

pub(crate) const SUPPORTED_SCHEMES: [&str; 4] = ["ws", "wss", "http", "https"];
pub(crate) const MAX_RECONNECT_INTERVAL_MS: u64 = 600_000;
pub(crate) const MAX_RECONNECT_ATTEMPTS: u32 = 100;
pub(crate) const MAX_DELAY_MS: u64 = 60_000;

/// Tunables for the realtime connection, persisted as `realtime.json`.
///
/// Identity (user id, bearer token) is deliberately absent: it comes from the
/// surrounding application at runtime and never touches disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Pause between the socket opening and the `auth` frame.
    #[serde(default = "default_auth_delay_ms")]
    pub auth_delay_ms: u64,

    /// Pause between delivering an OCR rate-limit error and closing the socket.
    #[serde(default = "default_rate_limit_close_delay_ms")]
    pub rate_limit_close_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            endpoint: default_endpoint(),
            auto_reconnect: default_auto_reconnect(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            auth_delay_ms: default_auth_delay_ms(),
            rate_limit_close_delay_ms: default_rate_limit_close_delay_ms(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_auto_reconnect() -> bool {
    true
}
fn default_reconnect_interval_ms() -> u64 {
    3_000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_auth_delay_ms() -> u64 {
    100
}
fn default_rate_limit_close_delay_ms() -> u64 {
    1_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ClientConfig {
    /// Load config from {config_dir}/realtime.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ClientConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Realtime config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read realtime config: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ClientConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse realtime config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Realtime config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/realtime.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation, serialization, write or
    /// rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Realtime config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.endpoint)?;
        validate_reconnect(self.reconnect_interval_ms, self.max_reconnect_attempts)?;
        validate_delay("auth_delay_ms", self.auth_delay_ms)?;
        validate_delay("rate_limit_close_delay_ms", self.rate_limit_close_delay_ms)?;
        Ok(())
    }
}

#[track_caller]
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: format!("endpoint '{endpoint}' is not a valid URL: {e}"),
    })?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!(
                "endpoint scheme '{}' is not one of {:?}",
                url.scheme(),
                SUPPORTED_SCHEMES
            ),
        });
    }

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("endpoint '{endpoint}' has no host"),
        });
    }

    Ok(url)
}

#[track_caller]
pub(crate) fn validate_reconnect(interval_ms: u64, max_attempts: u32) -> Result<(), ConfigError> {
    if interval_ms == 0 || interval_ms > MAX_RECONNECT_INTERVAL_MS {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!(
                "reconnect_interval_ms must be in 1..={MAX_RECONNECT_INTERVAL_MS}, got {interval_ms}"
            ),
        });
    }

    if max_attempts == 0 || max_attempts > MAX_RECONNECT_ATTEMPTS {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!(
                "max_reconnect_attempts must be in 1..={MAX_RECONNECT_ATTEMPTS}, got {max_attempts}"
            ),
        });
    }

    Ok(())
}

#[track_caller]
pub(crate) fn validate_delay(field: &str, delay_ms: u64) -> Result<(), ConfigError> {
    if delay_ms > MAX_DELAY_MS {
        return Err(ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("{field} must be at most {MAX_DELAY_MS}, got {delay_ms}"),
        });
    }
    Ok(())
}
