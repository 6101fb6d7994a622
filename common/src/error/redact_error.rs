use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a secret-bearing type is pushed through serde by accident.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Redaction Error: {type_name} refuses implicit serialization {location}")]
    Serialization {
        type_name: &'static str,
        location: ErrorLocation,
    },
}
