use crate::dispatch::triage::{is_credential_error_type, is_internal, is_rate_limited};

/// **VALUE**: Rate-limit phrases match regardless of case or spelling variant.
///
/// **WHY THIS MATTERS**: A missed rate-limit keeps the socket open and the user retrying
/// into the throttle.
///
/// **BUG THIS CATCHES**: Would catch case-sensitive matching.
#[test]
fn given_rate_limit_texts_when_triaged_then_detected() {
    assert!(is_rate_limited("Rate limit exceeded for OCR"));
    assert!(is_rate_limited("RATE-LIMIT reached"));
    assert!(is_rate_limited("429 Too Many Requests"));
    assert!(is_rate_limited("Daily quota exceeded"));
    assert!(!is_rate_limited("Image could not be read"));
}

/// **VALUE**: Protocol noise is recognized, domain errors are not.
///
/// **WHY THIS MATTERS**: Suppressing a real error hides it from the user; showing parse
/// noise confuses them.
///
/// **BUG THIS CATCHES**: Would catch an over-broad phrase such as "error".
#[test]
fn given_error_texts_when_checked_for_internal_then_only_protocol_noise_matches() {
    assert!(is_internal("Invalid message format"));
    assert!(is_internal("Failed to parse payload"));
    assert!(is_internal("JSON decode error at line 1"));
    assert!(is_internal("Unknown message type: foo"));
    assert!(!is_internal("Recipe database unavailable"));
}

#[test]
fn given_error_types_when_checked_for_credential_then_matches_known_values() {
    assert!(is_credential_error_type("token_expired"));
    assert!(is_credential_error_type(" AUTH_FAILED "));
    assert!(is_credential_error_type("invalid_token"));
    assert!(!is_credential_error_type("validation"));
}
