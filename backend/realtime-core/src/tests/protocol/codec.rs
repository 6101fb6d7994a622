// Unit tests for the JSON codec
// Inbound decoding is total: known variant, Unknown, or a Decoding error

use crate::error::codec::CodecError;
use crate::protocol::codec::{decode, encode};
use crate::protocol::messages::{ClientMessage, ClientRequest, ServerMessage};

use common::RedactedToken;

use serde_json::{Value, json};

fn decode_json(value: Value) -> ServerMessage {
    decode(value.to_string().as_bytes()).expect("frame should decode")
}

// ============================================
// ENCODING
// ============================================

/// **VALUE**: The auth frame carries the raw token under `token`.
///
/// **WHY THIS MATTERS**: The backend authenticates on this exact shape. A redacted value
/// on the wire would make every session fail auth.
///
/// **BUG THIS CATCHES**: Would catch the token field falling back to `RedactedToken`'s
/// refusing Serialize impl, or the tag being renamed.
#[test]
fn given_auth_message_when_encoded_then_token_is_sent_verbatim() {
    // GIVEN: An auth message
    let message = ClientMessage::Auth {
        token: RedactedToken::new("bearer-123"),
    };

    // WHEN: Encoding
    let text = encode(&message).expect("auth should encode");

    // THEN: Exactly {"type":"auth","token":"bearer-123"}
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"type": "auth", "token": "bearer-123"}));
}

/// **VALUE**: Application requests map to `ocr` and `recommendation` frames.
///
/// **WHY THIS MATTERS**: These are the only two requests the backend accepts from the app.
///
/// **BUG THIS CATCHES**: Would catch a serde rename changing the discriminants.
#[test]
fn given_client_requests_when_encoded_then_use_snake_case_discriminants() {
    let ocr: ClientMessage = ClientRequest::Ocr {
        image_url: "https://img/1.png".to_string(),
    }
    .into();
    let recommendation: ClientMessage = ClientRequest::Recommendation.into();

    let ocr: Value = serde_json::from_str(&encode(&ocr).unwrap()).unwrap();
    let recommendation: Value = serde_json::from_str(&encode(&recommendation).unwrap()).unwrap();

    assert_eq!(
        ocr,
        json!({"type": "ocr", "image_url": "https://img/1.png"})
    );
    assert_eq!(recommendation, json!({"type": "recommendation"}));
}

// ============================================
// DECODING
// ============================================

/// **VALUE**: Every known discriminant decodes to its own variant.
///
/// **WHY THIS MATTERS**: A discriminant that silently falls into `Unknown` would drop a
/// whole event kind without any error.
///
/// **BUG THIS CATCHES**: Would catch a missing arm or a typo in a discriminant constant.
#[test]
fn given_each_known_type_when_decoded_then_maps_to_matching_variant() {
    let cases = [
        ("auth_response", "auth_response"),
        ("ocr_progress", "ocr_progress"),
        ("ocr_result", "ocr_result"),
        ("ocr_error", "ocr_error"),
        ("recommendation_progress", "recommendation_progress"),
        ("recommendation_result", "recommendation_result"),
        ("recommendation_error", "recommendation_error"),
        ("general_progress", "general_progress"),
        ("general_error", "general_error"),
        ("token_expired", "token_expired"),
        ("error", "error"),
    ];

    for (wire, expected) in cases {
        let message = decode_json(json!({ "type": wire }));
        assert_eq!(message.kind(), expected, "wire type {wire}");
        assert!(
            !matches!(message, ServerMessage::Unknown { .. }),
            "{wire} should not be Unknown"
        );
    }
}

/// **VALUE**: An unrecognized discriminant is preserved, not rejected.
///
/// **WHY THIS MATTERS**: The backend can ship new frame types before the client knows them.
/// Those must surface as `UnknownMessage`, never as a parse failure.
///
/// **BUG THIS CATCHES**: Would catch unknown types being reported as decoding errors.
#[test]
fn given_unknown_type_when_decoded_then_returns_unknown_with_kind() {
    let message = decode_json(json!({"type": "shopping_list", "items": []}));

    assert_eq!(
        message,
        ServerMessage::Unknown {
            kind: "shopping_list".to_string()
        }
    );
}

/// **VALUE**: Garbage in yields a Decoding error, never a panic.
///
/// **WHY THIS MATTERS**: The reader keeps the socket open after a bad frame; the codec must
/// report the problem rather than crash the connection task.
///
/// **BUG THIS CATCHES**: Would catch non-object JSON or a missing discriminant slipping
/// through as `Unknown`.
#[test]
fn given_malformed_frames_when_decoded_then_returns_decoding_error() {
    let frames: [&[u8]; 5] = [
        b"not json",
        b"[1,2,3]",
        b"\"auth_response\"",
        br#"{"message":"no type"}"#,
        br#"{"type":42}"#,
    ];

    for frame in frames {
        let result = decode(frame);
        assert!(
            matches!(result, Err(CodecError::Decoding { .. })),
            "frame {:?} should fail to decode, got {result:?}",
            String::from_utf8_lossy(frame)
        );
    }
}

/// **VALUE**: A known frame with a wrongly typed field is a decoding error.
///
/// **WHY THIS MATTERS**: Half-parsed frames would produce events with invented values.
///
/// **BUG THIS CATCHES**: Would catch lenient decoding that swallows type mismatches.
#[test]
fn given_known_type_with_wrong_field_type_when_decoded_then_returns_decoding_error() {
    let frame = json!({"type": "auth_response", "success": "yes"}).to_string();

    let result = decode(frame.as_bytes());

    let err = result.expect_err("mistyped field should fail");
    assert!(err.to_string().contains("auth_response"), "Got: {err}");
}

/// **VALUE**: Progress decodes from both the nested and the inline layout, with camelCase.
///
/// **WHY THIS MATTERS**: Different backend builds send both shapes.
///
/// **BUG THIS CATCHES**: Would catch the flatten/alias handling regressing for either shape.
#[test]
fn given_nested_and_inline_progress_when_decoded_then_fields_are_read() {
    let nested = decode_json(json!({
        "type": "ocr_progress",
        "progress": {"currentStep": 2, "totalSteps": 4, "stepDescription": "Reading"}
    }));
    let inline = decode_json(json!({
        "type": "recommendation_progress",
        "current_step": 1,
        "total_steps": 3,
        "percentage": 33.0
    }));

    let ServerMessage::OcrProgress(nested) = nested else {
        panic!("expected OcrProgress");
    };
    let nested = nested.into_fields();
    assert_eq!(nested.current_step, Some(2));
    assert_eq!(nested.total_steps, Some(4));
    assert_eq!(nested.step_description.as_deref(), Some("Reading"));

    let ServerMessage::RecommendationProgress(inline) = inline else {
        panic!("expected RecommendationProgress");
    };
    let inline = inline.into_fields();
    assert_eq!(inline.current_step, Some(1));
    assert_eq!(inline.percentage, Some(33.0));
}

/// **VALUE**: Error frames carrying several text fields decode, and `message` wins.
///
/// **WHY THIS MATTERS**: Some backend builds send `{"message": ..., "error": "RATE_LIMIT"}`.
/// Rejecting those as malformed would hide the rate limit from the user.
///
/// **BUG THIS CATCHES**: Would catch the text fields being serde aliases of one another,
/// which fails with "duplicate field".
#[test]
fn given_error_frames_with_several_text_fields_when_decoded_then_message_preferred() {
    // GIVEN: An ocr_error and a generic error, each with message and error set
    let ocr = decode_json(json!({
        "type": "ocr_error",
        "message": "OCR rate limit exceeded",
        "error": "RATE_LIMIT"
    }));
    let generic = decode_json(json!({
        "type": "error",
        "message": "Too many requests",
        "error": "RATE_LIMIT",
        "detail": "retry later"
    }));

    // THEN: Both decode and expose the message text
    let ServerMessage::OcrError(ocr) = ocr else {
        panic!("expected OcrError");
    };
    assert_eq!(ocr.into_text().as_deref(), Some("OCR rate limit exceeded"));

    let ServerMessage::Error(generic) = generic else {
        panic!("expected Error");
    };
    assert_eq!(generic.text().as_deref(), Some("Too many requests"));
}

/// **VALUE**: Blank `message` falls through to `error`, then `detail`.
///
/// **BUG THIS CATCHES**: Would catch an empty string hiding the real error text.
#[test]
fn given_error_frame_with_blank_message_when_decoded_then_falls_back_to_other_fields() {
    let with_error = decode_json(json!({"type": "general_error", "message": " ", "error": "Boom"}));
    let with_detail = decode_json(json!({"type": "recommendation_error", "detail": "No pantry"}));

    let ServerMessage::GeneralError(with_error) = with_error else {
        panic!("expected GeneralError");
    };
    let ServerMessage::RecommendationError(with_detail) = with_detail else {
        panic!("expected RecommendationError");
    };
    assert_eq!(with_error.into_text().as_deref(), Some("Boom"));
    assert_eq!(with_detail.into_text().as_deref(), Some("No pantry"));
}
