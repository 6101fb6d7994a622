use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, ThisError)]
pub enum CodecError {
    #[error("Encoding Error: {message} {location}")]
    Encoding {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decoding Error: {message} {location}")]
    Decoding {
        message: String,
        location: ErrorLocation,
    },
}

impl CodecError {
    #[track_caller]
    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        CodecError::Decoding {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
