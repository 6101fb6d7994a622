// Unit tests for the dispatch router
// Frames go in through the real codec so wire shapes are covered too

use crate::dispatch::{RouteAction, Router};
use crate::error::realtime::RealtimeError;
use crate::events::ClientEvent;
use crate::protocol::codec::decode;

use serde_json::{Value, json};

fn route(router: &mut Router, frame: Value) -> (Option<ClientEvent>, RouteAction) {
    let message = decode(frame.to_string().as_bytes()).expect("frame should decode");
    let outcome = router.route(message);
    (outcome.event, outcome.action)
}

/// **VALUE**: A successful auth response yields `Authenticated` and nothing else.
///
/// **BUG THIS CATCHES**: Would catch auth success being treated as a rejection.
#[test]
fn given_auth_success_when_routed_then_authenticated() {
    let mut router = Router::new();

    let (event, action) = route(&mut router, json!({"type": "auth_response", "success": true}));

    assert!(matches!(event, Some(ClientEvent::Authenticated)));
    assert_eq!(action, RouteAction::None);
}

/// **VALUE**: A rejected auth response becomes TokenExpired and rejects the credential.
///
/// **WHY THIS MATTERS**: The connection must stop and wait for a new token instead of
/// reconnecting with the one that just failed.
///
/// **BUG THIS CATCHES**: Would catch a rejection routed as a plain general error.
#[test]
fn given_auth_failure_when_routed_then_token_expired_and_credential_rejected() {
    let mut router = Router::new();

    let (event, action) = route(
        &mut router,
        json!({"type": "auth_response", "success": false, "message": "bad token"}),
    );

    match event {
        Some(ClientEvent::TokenExpired(RealtimeError::Auth { message, .. })) => {
            assert_eq!(message, "bad token");
        }
        other => panic!("expected TokenExpired(Auth), got {other:?}"),
    }
    assert_eq!(action, RouteAction::RejectCredential);
}

/// **VALUE**: An empty recommendation result reports zero recipes and a default reason.
///
/// **WHY THIS MATTERS**: "No matches" is a normal outcome and must render as one.
///
/// **BUG THIS CATCHES**: Would catch `total_count` echoing a stale server value.
#[test]
fn given_empty_recommendation_result_when_routed_then_total_zero_and_reason_set() {
    let mut router = Router::new();

    let (event, _) = route(
        &mut router,
        json!({"type": "recommendation_result", "recipes": [], "total_count": 3}),
    );

    let Some(ClientEvent::RecommendationResult(result)) = event else {
        panic!("expected RecommendationResult");
    };
    assert_eq!(result.total_count, 0);
    assert!(result.reason.starts_with("No recommended"), "{}", result.reason);
}

/// **VALUE**: An OCR error mentioning a rate limit asks for the socket to be closed.
///
/// **WHY THIS MATTERS**: Throttled clients must back off; keeping the socket open invites
/// the user to retry immediately.
///
/// **BUG THIS CATCHES**: Would catch the rate-limit branch delivering a plain server error.
#[test]
fn given_rate_limited_ocr_error_when_routed_then_close_requested() {
    let mut router = Router::new();

    let (event, action) = route(
        &mut router,
        json!({"type": "ocr_error", "message": "OCR rate limit exceeded"}),
    );

    assert!(
        matches!(event, Some(ClientEvent::OcrError(RealtimeError::RateLimit { .. }))),
        "got {event:?}"
    );
    assert_eq!(action, RouteAction::CloseForRateLimit);
}

/// **VALUE**: A generic error that mentions a rate limit is handled like an OCR one.
///
/// **BUG THIS CATCHES**: Would catch generic errors skipping the rate-limit check.
#[test]
fn given_rate_limited_generic_error_when_routed_then_close_requested() {
    let mut router = Router::new();

    let (event, action) = route(
        &mut router,
        json!({"type": "error", "message": "Too many requests"}),
    );

    assert!(matches!(event, Some(ClientEvent::OcrError(_))));
    assert_eq!(action, RouteAction::CloseForRateLimit);
}

/// **VALUE**: Internal protocol noise in a generic error is swallowed.
///
/// **WHY THIS MATTERS**: Users cannot act on "invalid message format"; showing it only
/// generates support tickets.
///
/// **BUG THIS CATCHES**: Would catch suppression being skipped or applied to real errors.
#[test]
fn given_internal_generic_error_when_routed_then_no_event() {
    let mut router = Router::new();

    let (suppressed, _) = route(
        &mut router,
        json!({"type": "error", "message": "Invalid message format"}),
    );
    let (surfaced, _) = route(
        &mut router,
        json!({"type": "error", "message": "Recipe service unavailable"}),
    );

    assert!(suppressed.is_none(), "got {suppressed:?}");
    match surfaced {
        Some(ClientEvent::GeneralError(RealtimeError::Server { message, .. })) => {
            assert_eq!(message, "Recipe service unavailable");
        }
        other => panic!("expected GeneralError, got {other:?}"),
    }
}

/// **VALUE**: A generic error with a credential `error_type` becomes TokenExpired.
///
/// **BUG THIS CATCHES**: Would catch expired sessions showing as a generic failure.
#[test]
fn given_generic_error_with_credential_type_when_routed_then_token_expired() {
    let mut router = Router::new();

    let (event, action) = route(
        &mut router,
        json!({"type": "error", "message": "Session ended", "error_type": "token_expired"}),
    );

    assert!(matches!(event, Some(ClientEvent::TokenExpired(_))));
    assert_eq!(action, RouteAction::RejectCredential);
}

/// **VALUE**: Progress is tracked per operation and cleared by that operation's result.
///
/// **WHY THIS MATTERS**: OCR and recommendation run concurrently; finishing one must not
/// wipe the other's progress bar.
///
/// **BUG THIS CATCHES**: Would catch a shared progress slot or a result clearing both.
#[test]
fn given_two_progress_tracks_when_one_finishes_then_only_it_is_cleared() {
    let mut router = Router::new();

    route(
        &mut router,
        json!({"type": "ocr_progress", "progress": {"current_step": 1, "total_steps": 2}}),
    );
    route(
        &mut router,
        json!({"type": "recommendation_progress", "percentage": 40.0}),
    );
    assert_eq!(
        router.progress().ocr.as_ref().map(|p| p.percentage),
        Some(50.0)
    );
    assert!(router.progress().recommendation.is_some());

    let (event, _) = route(&mut router, json!({"type": "ocr_result", "data": {"text": "flour"}}));

    assert!(matches!(event, Some(ClientEvent::OcrResult(_))));
    assert!(router.progress().ocr.is_none());
    assert!(router.progress().recommendation.is_some());

    router.reset();
    assert!(router.progress().recommendation.is_none());
}

/// **VALUE**: Unknown frame types surface as UnknownMessage carrying the type.
///
/// **BUG THIS CATCHES**: Would catch unknown frames being dropped silently.
#[test]
fn given_unknown_frame_when_routed_then_unknown_message_event() {
    let mut router = Router::new();

    let (event, action) = route(&mut router, json!({"type": "meal_plan"}));

    match event {
        Some(ClientEvent::UnknownMessage { kind }) => assert_eq!(kind, "meal_plan"),
        other => panic!("expected UnknownMessage, got {other:?}"),
    }
    assert_eq!(action, RouteAction::None);
}

/// **VALUE**: A rate-limited error frame that also carries an `error` code still closes.
///
/// **BUG THIS CATCHES**: Would catch the extra field making the frame undecodable, which
/// skips both the OCR error and the rate-limit close.
#[test]
fn given_rate_limit_frame_with_error_code_when_routed_then_close_requested() {
    let mut router = Router::new();

    let (event, action) = route(
        &mut router,
        json!({"type": "error", "message": "OCR rate limit exceeded", "error": "RATE_LIMIT"}),
    );

    assert!(
        matches!(event, Some(ClientEvent::OcrError(RealtimeError::RateLimit { .. }))),
        "got {event:?}"
    );
    assert_eq!(action, RouteAction::CloseForRateLimit);
}
