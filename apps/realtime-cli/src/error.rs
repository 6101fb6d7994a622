use realtime_core::RealtimeError;
use realtime_core::error::CoreError;
use realtime_core::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors that stop the command-line client.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from this app (logging, environment, stdin)
    #[error("Cli Error: {message} {location}")]
    Cli {
        message: String,
        location: ErrorLocation,
    },

    /// Config file or connection parameters rejected
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Error from realtime-core (client creation, connect)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// A line typed at the prompt could not be understood
    #[error("Command Error: {message} {location}")]
    Command {
        message: String,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn cli(message: impl Into<String>) -> Self {
        CliError::Cli {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn command(message: impl Into<String>) -> Self {
        CliError::Command {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for CliError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        let message = error.to_string();
        let location = ErrorLocation::from(Location::caller());
        match error {
            CoreError::Config(_) => CliError::Config { message, location },
            CoreError::Codec(_) | CoreError::Realtime(_) => CliError::Core { message, location },
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        CoreError::from(error).into()
    }
}

impl From<RealtimeError> for CliError {
    #[track_caller]
    fn from(error: RealtimeError) -> Self {
        CoreError::from(error).into()
    }
}
