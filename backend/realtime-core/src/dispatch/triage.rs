//! Substring classification of server error text.

/// Phrases the backend uses when an OCR caller is throttled.
const RATE_LIMIT_PHRASES: [&str; 5] = [
    "rate limit",
    "rate-limit",
    "rate_limit",
    "too many requests",
    "quota exceeded",
];

/// Protocol and parse noise that means nothing to an end user.
const INTERNAL_PHRASES: [&str; 6] = [
    "invalid message format",
    "failed to parse",
    "json decode",
    "unknown message type",
    "message parsing",
    "protocol error",
];

/// `error_type` values that mean the session credential is no longer accepted.
const CREDENTIAL_ERROR_TYPES: [&str; 3] = ["token_expired", "auth_failed", "invalid_token"];

pub fn is_rate_limited(message: &str) -> bool {
    contains_any(message, &RATE_LIMIT_PHRASES)
}

pub fn is_internal(message: &str) -> bool {
    contains_any(message, &INTERNAL_PHRASES)
}

pub fn is_credential_error_type(error_type: &str) -> bool {
    let error_type = error_type.trim().to_ascii_lowercase();
    CREDENTIAL_ERROR_TYPES.contains(&error_type.as_str())
}

fn contains_any(message: &str, phrases: &[&str]) -> bool {
    let message = message.to_lowercase();
    phrases.iter().any(|phrase| message.contains(phrase))
}
