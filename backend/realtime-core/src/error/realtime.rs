//! Failure taxonomy for the realtime connection.
//!
//! These values travel two ways: returned from [`RealtimeClient::connect`] when the
//! transport cannot be constructed, and delivered as event payloads for everything else.
//!
//! [`RealtimeClient::connect`]: crate::RealtimeClient::connect

use crate::error::codec::CodecError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, ThisError)]
pub enum RealtimeError {
    /// Socket-level open/send failure. Recoverable through reconnection.
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encoding Error: {message} {location}")]
    Encoding {
        message: String,
        location: ErrorLocation,
    },

    /// Malformed inbound frame. The connection stays open.
    #[error("Decoding Error: {message} {location}")]
    Decoding {
        message: String,
        location: ErrorLocation,
    },

    /// Credential rejected. Never retried automatically.
    #[error("Auth Error: {message} {location}")]
    Auth {
        message: String,
        location: ErrorLocation,
    },

    /// OCR throttling. The connection is closed on purpose after delivery.
    #[error("Rate Limit Error: {message} {location}")]
    RateLimit {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transient Server Error: {message} (close code {close_code}) {location}")]
    TransientServer {
        message: String,
        close_code: u16,
        location: ErrorLocation,
    },

    #[error("Terminal Reconnect Failure: {message} {location}")]
    TerminalReconnectFailure {
        message: String,
        attempts: u32,
        location: ErrorLocation,
    },

    /// Domain failure reported by the backend in an error frame.
    #[error("Server Error: {message} {location}")]
    Server {
        message: String,
        location: ErrorLocation,
    },

    /// The client handle can no longer reach its connection task.
    #[error("Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },
}

impl RealtimeError {
    /// User-facing text without the source location.
    pub fn message(&self) -> &str {
        match self {
            RealtimeError::Transport { message, .. }
            | RealtimeError::Encoding { message, .. }
            | RealtimeError::Decoding { message, .. }
            | RealtimeError::Auth { message, .. }
            | RealtimeError::RateLimit { message, .. }
            | RealtimeError::TransientServer { message, .. }
            | RealtimeError::TerminalReconnectFailure { message, .. }
            | RealtimeError::Server { message, .. }
            | RealtimeError::Client { message, .. } => message,
        }
    }

    pub fn location(&self) -> ErrorLocation {
        match self {
            RealtimeError::Transport { location, .. }
            | RealtimeError::Encoding { location, .. }
            | RealtimeError::Decoding { location, .. }
            | RealtimeError::Auth { location, .. }
            | RealtimeError::RateLimit { location, .. }
            | RealtimeError::TransientServer { location, .. }
            | RealtimeError::TerminalReconnectFailure { location, .. }
            | RealtimeError::Server { location, .. }
            | RealtimeError::Client { location, .. } => *location,
        }
    }

    /// Whether the reconnection policy may act on this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RealtimeError::Transport { .. } | RealtimeError::TransientServer { .. }
        )
    }

    #[track_caller]
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        RealtimeError::Transport {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        RealtimeError::Auth {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn server(message: impl Into<String>) -> Self {
        RealtimeError::Server {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn client(message: impl Into<String>) -> Self {
        RealtimeError::Client {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CodecError> for RealtimeError {
    #[track_caller]
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::Encoding { message, .. } => RealtimeError::Encoding {
                message,
                location: ErrorLocation::from(Location::caller()),
            },
            CodecError::Decoding { message, .. } => RealtimeError::Decoding {
                message,
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}
