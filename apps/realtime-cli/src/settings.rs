//! Where the CLI gets its configuration and identity from.
//!
//! Config directory lookup order:
//! 1. `RECIPE_WS_CONFIG_DIR` environment variable
//! 2. `{platform config dir}/recipe-realtime` via the `dirs` crate
//!
//! User id and token come from `RECIPE_WS_USER_ID` / `RECIPE_WS_TOKEN`, optionally loaded
//! from a `.env` file first. They never touch `realtime.json`.

use crate::error::CliError;

use realtime_core::{ClientConfig, ConnectionParams};

use common::RedactedToken;

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub const CONFIG_DIR_ENV: &str = "RECIPE_WS_CONFIG_DIR";
pub const USER_ID_ENV: &str = "RECIPE_WS_USER_ID";
pub const TOKEN_ENV: &str = "RECIPE_WS_TOKEN";

const APP_DIR_NAME: &str = "recipe-realtime";

/// How the config directory was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSource {
    EnvVar,
    PlatformDefault,
}

impl fmt::Display for DirSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirSource::EnvVar => write!(f, "{CONFIG_DIR_ENV}"),
            DirSource::PlatformDefault => write!(f, "platform default"),
        }
    }
}

/// Load `.env` from the working directory if there is one.
///
/// Returns the file that was loaded. A missing file is normal; a malformed one is logged.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Ignoring malformed .env: {e}");
            None
        }
    }
}

/// Resolve the config directory.
///
/// # Errors
///
/// Returns [`CliError::Cli`] when no override is set and the platform has no config dir.
pub fn resolve_config_dir() -> Result<(PathBuf, DirSource), CliError> {
    if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV)
        && !custom_dir.trim().is_empty()
    {
        return Ok((PathBuf::from(custom_dir), DirSource::EnvVar));
    }

    dirs::config_dir()
        .map(|dir| (dir.join(APP_DIR_NAME), DirSource::PlatformDefault))
        .ok_or_else(|| {
            CliError::cli(format!(
                "No platform config directory; set {CONFIG_DIR_ENV}"
            ))
        })
}

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub config: ClientConfig,
    pub user_id: String,
    pub token: RedactedToken,
}

impl Settings {
    /// Read `realtime.json` from `config_dir` and the identity from the environment.
    ///
    /// # Errors
    ///
    /// - [`CliError::Config`] if the config file is corrupt or invalid
    /// - [`CliError::Cli`] if the user id or token variable is missing
    pub fn load(config_dir: &Path) -> Result<Self, CliError> {
        let config = ClientConfig::load(config_dir)?;
        debug!("Realtime endpoint from config: {}", config.endpoint);

        let user_id = required_env(USER_ID_ENV)?;
        let token = RedactedToken::new(required_env(TOKEN_ENV)?);
        info!("Loaded credential for user {user_id} ({} chars)", token.len());

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            config,
            user_id,
            token,
        })
    }

    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the combined parameters fail validation.
    pub fn connection_params(&self) -> Result<ConnectionParams, CliError> {
        Ok(ConnectionParams::from_config(
            &self.config,
            self.user_id.clone(),
            self.token.clone(),
        )?)
    }
}

#[track_caller]
fn required_env(name: &str) -> Result<String, CliError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) | Err(env::VarError::NotPresent) => {
            Err(CliError::cli(format!("{name} is not set")))
        }
        Err(env::VarError::NotUnicode(_)) => {
            Err(CliError::cli(format!("{name} contains invalid unicode")))
        }
    }
}
