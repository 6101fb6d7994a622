//! JSON codec for the realtime protocol.
//!
//! `decode` is pure and total: every input yields a known variant,
//! [`ServerMessage::Unknown`], or a [`CodecError::Decoding`]. A bad frame is the caller's
//! cue to report "message parsing failed" and keep reading, never to close the socket.

use crate::error::codec::CodecError;
use crate::protocol::messages::{
    AUTH_RESPONSE, ClientMessage, ERROR, GENERAL_ERROR, GENERAL_PROGRESS, OCR_ERROR,
    OCR_PROGRESS, OCR_RESULT, RECOMMENDATION_ERROR, RECOMMENDATION_PROGRESS,
    RECOMMENDATION_RESULT, ServerMessage, TOKEN_EXPIRED,
};

use common::ErrorLocation;

use std::panic::Location;

use serde::de::DeserializeOwned;
use serde_json::Value;

const DISCRIMINANT_FIELD: &str = "type";

/// Serialize an outbound message to the text of one frame.
///
/// # Errors
///
/// Returns [`CodecError::Encoding`] if serde rejects the value; well-typed messages
/// never do.
pub fn encode(message: &ClientMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::Encoding {
        message: format!("Failed to encode {} message: {e}", message.kind()),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Parse one inbound frame.
///
/// # Errors
///
/// Returns [`CodecError::Decoding`] when the bytes are not a JSON object, the `type`
/// field is missing or not a string, or a known frame carries fields of the wrong type.
pub fn decode(bytes: &[u8]) -> Result<ServerMessage, CodecError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::decoding(format!("Frame is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(CodecError::decoding("Frame is not a JSON object"));
    }

    let kind = value
        .get(DISCRIMINANT_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::decoding("Frame has no string `type` discriminant"))?
        .to_string();

    let message = match kind.as_str() {
        AUTH_RESPONSE => ServerMessage::AuthResponse(payload(&kind, value)?),
        OCR_PROGRESS => ServerMessage::OcrProgress(payload(&kind, value)?),
        OCR_RESULT => ServerMessage::OcrResult(payload(&kind, value)?),
        OCR_ERROR => ServerMessage::OcrError(payload(&kind, value)?),
        RECOMMENDATION_PROGRESS => ServerMessage::RecommendationProgress(payload(&kind, value)?),
        RECOMMENDATION_RESULT => ServerMessage::RecommendationResult(payload(&kind, value)?),
        RECOMMENDATION_ERROR => ServerMessage::RecommendationError(payload(&kind, value)?),
        GENERAL_PROGRESS => ServerMessage::GeneralProgress(payload(&kind, value)?),
        GENERAL_ERROR => ServerMessage::GeneralError(payload(&kind, value)?),
        TOKEN_EXPIRED => ServerMessage::TokenExpired(payload(&kind, value)?),
        ERROR => ServerMessage::Error(payload(&kind, value)?),
        _ => ServerMessage::Unknown { kind },
    };

    Ok(message)
}

#[track_caller]
fn payload<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T, CodecError> {
    serde_json::from_value(value)
        .map_err(|e| CodecError::decoding(format!("Malformed `{kind}` frame: {e}")))
}
