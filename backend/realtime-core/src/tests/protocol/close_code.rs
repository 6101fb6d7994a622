use crate::protocol::close_code::{
    ABNORMAL, AUTH_FAILED, CloseDisposition, INTERNAL_ERROR, INVALID_USER, NORMAL, NO_STATUS,
    POLICY_VIOLATION, SERVICE_RESTART, TRY_AGAIN_LATER, classify_close_code, user_message,
};

/// **VALUE**: Every listed close code lands in its bucket.
///
/// **WHY THIS MATTERS**: The bucket decides between silence, a token-expired prompt and a
/// reconnect. A credential code in the transient bucket would hammer the backend with a
/// dead token.
///
/// **BUG THIS CATCHES**: Would catch a code moved between buckets.
#[test]
fn given_known_close_codes_when_classified_then_land_in_expected_bucket() {
    assert_eq!(classify_close_code(NORMAL), CloseDisposition::Normal);

    for code in [POLICY_VIOLATION, INVALID_USER, AUTH_FAILED] {
        assert_eq!(
            classify_close_code(code),
            CloseDisposition::InvalidCredential,
            "code {code}"
        );
    }

    for code in [ABNORMAL, INTERNAL_ERROR, SERVICE_RESTART, TRY_AGAIN_LATER] {
        assert_eq!(
            classify_close_code(code),
            CloseDisposition::Transient,
            "code {code}"
        );
    }
}

/// **VALUE**: Codes outside every set are Unrecognized.
///
/// **WHY THIS MATTERS**: Unrecognized closes follow the auto-reconnect flag instead of a
/// fixed rule.
///
/// **BUG THIS CATCHES**: Would catch a catch-all arm folding unknown codes into Transient.
#[test]
fn given_unlisted_close_code_when_classified_then_unrecognized() {
    for code in [NO_STATUS, 1001, 3000, 4000, 4999] {
        assert_eq!(
            classify_close_code(code),
            CloseDisposition::Unrecognized,
            "code {code}"
        );
    }
}

/// **VALUE**: User-facing text never exposes a bare number for known codes.
///
/// **BUG THIS CATCHES**: Would catch a known code falling through to the generic message.
#[test]
fn given_close_codes_when_user_message_then_known_codes_have_specific_text() {
    assert!(!user_message(TRY_AGAIN_LATER).contains("code"));
    assert!(!user_message(AUTH_FAILED).contains("code"));
    assert_eq!(user_message(3001), "Connection closed (code 3001)");
}
