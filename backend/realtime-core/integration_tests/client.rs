// Integration tests for RealtimeClient against a scripted WebSocket server
// Each test drives the server side frame by frame and observes client events

use crate::helpers::{
    ScriptedServer, TEST_TOKEN, TEST_USER_ID, WAIT, assert_no_event, close_with,
    connected_client, default_connected_client, expect_client_close, fast_params, recv_json,
    send_json, send_text, upgrade, wait_for_event, wait_for_state,
};

use realtime_core::{
    ClientEvent, ConnectionParams, ConnectionState, RealtimeClient, RealtimeError,
};

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;

// ============================================
// CONNECT AND AUTHENTICATE
// ============================================

/// **VALUE**: `connect()` opens `/ws/{user}?token=...` and then sends the auth frame.
///
/// **WHY THIS MATTERS**: The backend routes by the path and authenticates on the first
/// frame. Either one wrong and no realtime feature works.
///
/// **BUG THIS CATCHES**: Would catch a missing auth timer or the token being redacted on
/// the wire.
#[tokio::test]
async fn given_server_when_connect_then_auth_frame_carries_token() {
    // GIVEN: A running server and a fresh client
    let mut server = ScriptedServer::start().await;
    let client = RealtimeClient::new(fast_params(&server.endpoint, TEST_TOKEN)).unwrap();
    let mut events = client.subscribe();

    // WHEN: Connecting
    client.connect().await.expect("connect() should succeed");

    // THEN: The URL carries user and token, and the first frame is auth
    assert!(client.is_connected());
    let mut accepted = server.accept().await;
    assert_eq!(
        accepted.uri,
        format!("/ws/{TEST_USER_ID}?token={TEST_TOKEN}")
    );

    let auth = recv_json(&mut accepted.socket).await;
    assert_eq!(auth, json!({"type": "auth", "token": TEST_TOKEN}));

    send_json(
        &mut accepted.socket,
        json!({"type": "auth_response", "success": true}),
    )
    .await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::Authenticated)).await;
}

/// **VALUE**: A second `connect()` while connected does not open another socket.
///
/// **WHY THIS MATTERS**: Two sockets for one identity double every result the backend pushes.
///
/// **BUG THIS CATCHES**: Would catch `connect()` losing its idempotency check.
#[tokio::test]
async fn given_connected_client_when_connect_again_then_no_second_socket() {
    let mut server = ScriptedServer::start().await;
    let (client, _events, _accepted) = default_connected_client(&mut server).await;

    client.connect().await.expect("repeat connect() should resolve");

    server.assert_no_connection().await;
    assert!(client.is_connected());
}

/// **VALUE**: A refused handshake rejects `connect()` and leaves the client `Errored`.
///
/// **WHY THIS MATTERS**: This is the only failure surfaced as a returned error, so callers
/// rely on it to show "cannot reach server".
///
/// **BUG THIS CATCHES**: Would catch `connect()` hanging forever on a refused port.
#[tokio::test]
async fn given_unreachable_server_when_connect_then_transport_error_returned() {
    // GIVEN: A server that is no longer listening
    let mut server = ScriptedServer::start().await;
    server.stop().await;
    let client = RealtimeClient::new(fast_params(&server.endpoint, TEST_TOKEN)).unwrap();
    let mut events = client.subscribe();

    // WHEN: Connecting
    let result = client.connect().await;

    // THEN: Transport error returned, reported once as an event, state Errored
    assert!(
        matches!(result, Err(RealtimeError::Transport { .. })),
        "got {result:?}"
    );
    assert_eq!(client.state(), ConnectionState::Errored);
    wait_for_event(&mut events, |e| {
        matches!(e, ClientEvent::ConnectionError(RealtimeError::Transport { .. }))
    })
    .await;
}

/// **VALUE**: The auth frame is skipped when the socket closes inside the auth delay.
///
/// **WHY THIS MATTERS**: The backend may accept and immediately close (deploys, overload).
/// Sending auth on a dead socket would surface a bogus transport error to the user.
///
/// **BUG THIS CATCHES**: Would catch the auth timer firing without re-checking that the
/// connection is still up.
#[tokio::test]
async fn given_socket_closed_before_auth_delay_when_timer_fires_then_no_auth_attempted() {
    // GIVEN: An auth delay longer than the time the server keeps the socket
    let mut server = ScriptedServer::start().await;
    let params = ConnectionParams::builder()
        .with_endpoint(&server.endpoint)
        .with_user_id(TEST_USER_ID)
        .with_token(TEST_TOKEN)
        .with_auth_delay(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = RealtimeClient::new(params).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // WHEN: The server closes normally right after accepting
    let mut accepted = server.accept().await;
    close_with(&mut accepted.socket, 1000).await;
    wait_for_state(&client, ConnectionState::Disconnected).await;

    // THEN: The delay passes without an auth send or any error
    assert_no_event(&mut events, |e| {
        matches!(e, ClientEvent::ConnectionError(_) | ClientEvent::Authenticated)
    })
    .await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

// ============================================
// CLOSE CODES
// ============================================

/// **VALUE**: A normal close (1000) is silent and does not reconnect.
///
/// **WHY THIS MATTERS**: The backend closes normally on deploys it coordinates itself;
/// showing an error or reconnecting would fight that.
///
/// **BUG THIS CATCHES**: Would catch 1000 being treated as a transient failure.
#[tokio::test]
async fn given_connected_client_when_server_closes_normally_then_silent_disconnect() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    close_with(&mut accepted.socket, 1000).await;

    wait_for_state(&client, ConnectionState::Disconnected).await;
    assert_no_event(&mut events, |e| {
        matches!(
            e,
            ClientEvent::ConnectionError(_) | ClientEvent::TokenExpired(_)
        )
    })
    .await;
    server.assert_no_connection().await;
}

/// **VALUE**: A policy-violation close (1008) means the token is bad: TokenExpired, no retry.
///
/// **WHY THIS MATTERS**: Retrying with a rejected token gets the user rate-limited.
///
/// **BUG THIS CATCHES**: Would catch credential closes entering the reconnect loop.
#[tokio::test]
async fn given_connected_client_when_server_closes_with_policy_violation_then_token_expired() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    close_with(&mut accepted.socket, 1008).await;

    wait_for_event(&mut events, |e| {
        matches!(e, ClientEvent::TokenExpired(RealtimeError::Auth { .. }))
    })
    .await;
    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

/// **VALUE**: Transient closes reconnect, and each success restores the full budget.
///
/// **WHY THIS MATTERS**: A backend that restarts more often than the attempt bound over a
/// long session must not eventually strand the client.
///
/// **BUG THIS CATCHES**: Would catch the attempt counter never resetting on success.
#[tokio::test]
async fn given_repeated_transient_closes_when_each_reconnect_succeeds_then_keeps_reconnecting() {
    // GIVEN: A client with a budget of 3 attempts
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    // WHEN: The server fails the socket more times than the budget, recovering each time
    for _ in 0..4 {
        close_with(&mut accepted.socket, 1011).await;

        let event = wait_for_event(&mut events, |e| {
            matches!(e, ClientEvent::ConnectionError(_))
        })
        .await;
        assert!(
            matches!(
                event,
                ClientEvent::ConnectionError(RealtimeError::TransientServer {
                    close_code: 1011,
                    ..
                })
            ),
            "got {event:?}"
        );

        accepted = server.accept_authenticated().await;
        wait_for_event(&mut events, |e| matches!(e, ClientEvent::Authenticated)).await;
    }

    // THEN: Still connected
    assert!(client.is_connected());
}

/// **VALUE**: When every reconnect fails, one terminal failure is raised and the client
/// stays `Disconnected`.
///
/// **WHY THIS MATTERS**: The UI needs exactly one "could not reconnect" signal to switch
/// to an offline banner.
///
/// **BUG THIS CATCHES**: Would catch unbounded retries or a terminal event per attempt.
#[tokio::test]
async fn given_server_gone_when_reconnect_budget_exhausted_then_single_terminal_failure() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    // GIVEN: The server stops accepting
    server.stop().await;

    // WHEN: The live socket fails transiently
    close_with(&mut accepted.socket, 1011).await;

    // THEN: Exactly one terminal failure after 3 attempts
    let event = wait_for_event(&mut events, |e| {
        matches!(
            e,
            ClientEvent::ConnectionError(RealtimeError::TerminalReconnectFailure { .. })
        )
    })
    .await;
    assert!(
        matches!(
            event,
            ClientEvent::ConnectionError(RealtimeError::TerminalReconnectFailure {
                attempts: 3,
                ..
            })
        ),
        "got {event:?}"
    );

    wait_for_state(&client, ConnectionState::Disconnected).await;
    assert_no_event(&mut events, |e| {
        matches!(
            e,
            ClientEvent::ConnectionError(RealtimeError::TerminalReconnectFailure { .. })
        )
    })
    .await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

/// **VALUE**: `disconnect()` during the reconnect wait stops the pending attempt.
///
/// **WHY THIS MATTERS**: A reconnect firing after sign-out would reopen a socket with the
/// previous user's token.
///
/// **BUG THIS CATCHES**: Would catch the reconnect timer surviving `disconnect()`.
#[tokio::test]
async fn given_reconnect_pending_when_disconnect_then_no_reconnect_happens() {
    // GIVEN: A reconnect interval long enough to disconnect inside it
    let mut server = ScriptedServer::start().await;
    let params = ConnectionParams::builder()
        .with_endpoint(&server.endpoint)
        .with_user_id(TEST_USER_ID)
        .with_token(TEST_TOKEN)
        .with_reconnect_interval(Duration::from_millis(250))
        .with_auth_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let (client, _events, mut accepted) = connected_client(&mut server, params).await;

    close_with(&mut accepted.socket, 1012).await;
    wait_for_state(&client, ConnectionState::Reconnecting).await;

    // WHEN: Disconnecting before the timer fires
    client.disconnect();

    // THEN: Disconnected and no new socket, even after the interval has passed
    wait_for_state(&client, ConnectionState::Disconnected).await;
    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

/// **VALUE**: `connect()` after `disconnect()` restores automatic reconnection.
///
/// **BUG THIS CATCHES**: Would catch the disconnect override outliving the next session.
#[tokio::test]
async fn given_disconnected_client_when_connect_again_then_auto_reconnect_restored() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, _first) = default_connected_client(&mut server).await;

    client.disconnect();
    wait_for_state(&client, ConnectionState::Disconnected).await;

    client.connect().await.unwrap();
    let mut second = server.accept_authenticated().await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::Authenticated)).await;

    close_with(&mut second.socket, 1013).await;

    server.accept().await;
}

/// **VALUE**: With auto-reconnect off, a transient close is reported and not retried.
///
/// **BUG THIS CATCHES**: Would catch the transient bucket ignoring the auto-reconnect flag.
#[tokio::test]
async fn given_auto_reconnect_disabled_when_transient_close_then_error_without_reconnect() {
    let mut server = ScriptedServer::start().await;
    let params = ConnectionParams::builder()
        .with_endpoint(&server.endpoint)
        .with_user_id(TEST_USER_ID)
        .with_token(TEST_TOKEN)
        .with_auto_reconnect(false)
        .with_auth_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let (client, mut events, mut accepted) = connected_client(&mut server, params).await;

    close_with(&mut accepted.socket, 1011).await;

    let event = wait_for_event(&mut events, |e| matches!(e, ClientEvent::ConnectionError(_))).await;
    assert!(
        matches!(
            event,
            ClientEvent::ConnectionError(RealtimeError::TransientServer {
                close_code: 1011,
                ..
            })
        ),
        "got {event:?}"
    );
    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

/// **VALUE**: With auto-reconnect off, an unrecognized close code yields a generic
/// "connection closed" error naming the code.
///
/// **WHY THIS MATTERS**: Codes the client does not know still need a visible outcome, or
/// the UI silently shows a dead session as live.
///
/// **BUG THIS CATCHES**: Would catch unknown codes being dropped, or retried despite the
/// flag.
#[tokio::test]
async fn given_auto_reconnect_disabled_when_unrecognized_close_then_connection_closed_error() {
    let mut server = ScriptedServer::start().await;
    let params = ConnectionParams::builder()
        .with_endpoint(&server.endpoint)
        .with_user_id(TEST_USER_ID)
        .with_token(TEST_TOKEN)
        .with_auto_reconnect(false)
        .with_auth_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let (client, mut events, mut accepted) = connected_client(&mut server, params).await;

    close_with(&mut accepted.socket, 4500).await;

    let event = wait_for_event(&mut events, |e| matches!(e, ClientEvent::ConnectionError(_))).await;
    match event {
        ClientEvent::ConnectionError(RealtimeError::Transport { message, .. }) => {
            assert_eq!(message, "Connection closed (code 4500)");
        }
        other => panic!("expected Transport error, got {other:?}"),
    }
    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

// ============================================
// DISPATCH OVER THE WIRE
// ============================================

/// **VALUE**: An OCR rate-limit error is delivered, then the client closes without
/// reconnecting.
///
/// **WHY THIS MATTERS**: Staying connected lets the user hammer a throttled endpoint.
///
/// **BUG THIS CATCHES**: Would catch the deliberate close triggering the reconnect policy.
#[tokio::test]
async fn given_rate_limit_error_when_received_then_event_then_close_without_reconnect() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    send_json(
        &mut accepted.socket,
        json!({"type": "ocr_error", "message": "OCR rate limit exceeded, slow down"}),
    )
    .await;

    wait_for_event(&mut events, |e| {
        matches!(e, ClientEvent::OcrError(RealtimeError::RateLimit { .. }))
    })
    .await;
    assert_eq!(expect_client_close(&mut accepted.socket).await, Some(1000));
    wait_for_state(&client, ConnectionState::Disconnected).await;
    server.assert_no_connection().await;
}

/// **VALUE**: A malformed frame is reported and the socket stays usable.
///
/// **WHY THIS MATTERS**: One bad frame must not cost the user an in-flight OCR result.
///
/// **BUG THIS CATCHES**: Would catch a decode failure tearing down the reader.
#[tokio::test]
async fn given_malformed_frame_when_received_then_decoding_error_and_connection_stays_open() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    send_text(&mut accepted.socket, "{ definitely not json").await;
    wait_for_event(&mut events, |e| {
        matches!(e, ClientEvent::ConnectionError(RealtimeError::Decoding { .. }))
    })
    .await;

    send_json(
        &mut accepted.socket,
        json!({"type": "general_progress", "percent": 30, "message": "Working"}),
    )
    .await;
    let event =
        wait_for_event(&mut events, |e| matches!(e, ClientEvent::GeneralProgress(_))).await;

    let ClientEvent::GeneralProgress(progress) = event else {
        unreachable!()
    };
    assert_eq!(progress.percent, 30.0);
    assert!(client.is_connected());
}

/// **VALUE**: Progress is observable through `progress()` and cleared by the result.
///
/// **BUG THIS CATCHES**: Would catch the published snapshot lagging behind the event.
#[tokio::test]
async fn given_ocr_progress_then_result_when_received_then_snapshot_tracks_both() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    send_json(
        &mut accepted.socket,
        json!({"type": "ocr_progress", "progress": {"currentStep": 1, "totalSteps": 4, "stepDescription": "Scanning"}}),
    )
    .await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::OcrProgress(_))).await;

    let snapshot = client.progress();
    let ocr = snapshot.ocr.expect("OCR progress should be tracked");
    assert_eq!(ocr.percentage, 25.0);
    assert_eq!(ocr.step_description, "Scanning");

    send_json(
        &mut accepted.socket,
        json!({"type": "ocr_result", "data": {"ingredients": ["eggs"]}}),
    )
    .await;
    let event = wait_for_event(&mut events, |e| matches!(e, ClientEvent::OcrResult(_))).await;

    let ClientEvent::OcrResult(data) = event else {
        unreachable!()
    };
    assert_eq!(data["ingredients"][0], "eggs");
    assert!(client.progress().ocr.is_none());
}

/// **VALUE**: Recommendation results arrive normalized.
///
/// **BUG THIS CATCHES**: Would catch camelCase payloads losing fields end to end.
#[tokio::test]
async fn given_recommendation_result_when_received_then_recipes_normalized() {
    let mut server = ScriptedServer::start().await;
    let (_client, mut events, mut accepted) = default_connected_client(&mut server).await;

    send_json(
        &mut accepted.socket,
        json!({
            "type": "recommendation_result",
            "recipes": [
                {"id": 7, "title": "Pancakes", "cookTime": 20, "matchPercentage": 91.6},
                {"id": "r-8", "title": "Omelette", "difficulty": "easy"}
            ]
        }),
    )
    .await;

    let event = wait_for_event(&mut events, |e| {
        matches!(e, ClientEvent::RecommendationResult(_))
    })
    .await;

    let ClientEvent::RecommendationResult(result) = event else {
        unreachable!()
    };
    assert_eq!(result.total_count, 2);
    assert_eq!(result.reason, "Found 2 recommended recipes");
    assert_eq!(result.recipes[0].id, "7");
    assert_eq!(result.recipes[0].cook_time_minutes, 20);
    assert_eq!(result.recipes[0].match_percentage, 92);
    assert_eq!(result.recipes[0].difficulty, "medium");
    assert_eq!(result.recipes[1].difficulty, "easy");
}

// ============================================
// SENDING
// ============================================

/// **VALUE**: Requests made while disconnected are dropped, not queued.
///
/// **WHY THIS MATTERS**: A queued OCR request replayed minutes later, after a reconnect,
/// would surprise the user and waste quota.
///
/// **BUG THIS CATCHES**: Would catch sends leaking through before `Connected`.
#[tokio::test]
async fn given_disconnected_client_when_send_then_request_is_dropped() {
    // GIVEN: A client that has not connected yet
    let mut server = ScriptedServer::start().await;
    let client = RealtimeClient::new(fast_params(&server.endpoint, TEST_TOKEN)).unwrap();

    // WHEN: Requesting OCR before connecting
    client.request_ocr("https://img.example.com/early.png");

    // THEN: After connecting, the server sees auth and then only the later request
    client.connect().await.unwrap();
    let mut accepted = server.accept_authenticated().await;

    client.request_recommendations();
    let frame = recv_json(&mut accepted.socket).await;
    assert_eq!(frame, json!({"type": "recommendation"}));
}

#[tokio::test]
async fn given_connected_client_when_request_ocr_then_server_receives_image_url() {
    let mut server = ScriptedServer::start().await;
    let (client, _events, mut accepted) = default_connected_client(&mut server).await;

    client.request_ocr("https://img.example.com/receipt.jpg");

    let frame = recv_json(&mut accepted.socket).await;
    assert_eq!(
        frame,
        json!({"type": "ocr", "image_url": "https://img.example.com/receipt.jpg"})
    );
}

// ============================================
// CREDENTIAL ROTATION
// ============================================

/// **VALUE**: `update_token` on a live connection produces exactly one close and one new
/// connection carrying the new token.
///
/// **WHY THIS MATTERS**: Token refresh happens in the background every hour; an extra
/// socket or a stale token here breaks every long session.
///
/// **BUG THIS CATCHES**: Would catch the close triggering a reconnect alongside the
/// explicit one, or the old token being reused.
#[tokio::test]
async fn given_connected_client_when_update_token_then_one_cycle_with_new_token() {
    let mut server = ScriptedServer::start().await;
    let (client, _events, mut old) = default_connected_client(&mut server).await;

    client.update_token("rotated-token");

    assert_eq!(expect_client_close(&mut old.socket).await, Some(1000));
    let mut fresh = server.accept().await;
    assert!(
        fresh.uri.ends_with("token=rotated-token"),
        "uri was {}",
        fresh.uri
    );
    let auth = recv_json(&mut fresh.socket).await;
    assert_eq!(auth["token"], "rotated-token");

    server.assert_no_connection().await;
    assert!(client.is_connected());
}

/// **VALUE**: A rejected credential parks the client until a new token arrives.
///
/// **WHY THIS MATTERS**: The app refreshes the token in response to TokenExpired and
/// expects the session to resume without a manual reconnect.
///
/// **BUG THIS CATCHES**: Would catch the follow-up 1008 close starting a reconnect loop,
/// or `update_token` ignoring an `Errored` client.
#[tokio::test]
async fn given_rejected_auth_when_update_token_then_session_recovers() {
    // GIVEN: The server rejects the first token
    let mut server = ScriptedServer::start().await;
    let client = RealtimeClient::new(fast_params(&server.endpoint, TEST_TOKEN)).unwrap();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    let mut first = server.accept().await;
    recv_json(&mut first.socket).await;
    send_json(
        &mut first.socket,
        json!({"type": "auth_response", "success": false, "message": "Token expired"}),
    )
    .await;

    wait_for_event(&mut events, |e| matches!(e, ClientEvent::TokenExpired(_))).await;
    wait_for_state(&client, ConnectionState::Errored).await;

    close_with(&mut first.socket, 1008).await;
    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Errored);

    // WHEN: The app supplies a fresh token
    client.update_token("fresh-token");

    // THEN: A new connection authenticates with it
    let mut second = server.accept().await;
    let auth = recv_json(&mut second.socket).await;
    assert_eq!(auth, json!({"type": "auth", "token": "fresh-token"}));
    wait_for_state(&client, ConnectionState::Connected).await;
}

/// **VALUE**: After a credential close code, `update_token` reconnects with the new token.
///
/// **WHY THIS MATTERS**: 1008 and a `token_expired` frame mean the same thing to the app.
/// Both must resume once it supplies a fresh token.
///
/// **BUG THIS CATCHES**: Would catch the new token only being stored when the rejection
/// arrived as a close code instead of a frame.
#[tokio::test]
async fn given_policy_violation_close_when_update_token_then_reconnects_with_new_token() {
    // GIVEN: The server closes a live session with 1008
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    close_with(&mut accepted.socket, 1008).await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::TokenExpired(_))).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // WHEN: The app supplies a fresh token
    client.update_token("fresh-token");

    // THEN: A new connection carries it in the URL and the auth frame
    let mut fresh = server.accept().await;
    assert!(
        fresh.uri.ends_with("token=fresh-token"),
        "uri was {}",
        fresh.uri
    );
    let auth = recv_json(&mut fresh.socket).await;
    assert_eq!(auth, json!({"type": "auth", "token": "fresh-token"}));
    wait_for_state(&client, ConnectionState::Connected).await;
}

/// **VALUE**: `disconnect()` after a credential close wins over a later `update_token`.
///
/// **BUG THIS CATCHES**: Would catch the rejection flag surviving `disconnect()` and a
/// token refresh reopening a session the user closed.
#[tokio::test]
async fn given_credential_close_then_disconnect_when_update_token_then_stays_disconnected() {
    let mut server = ScriptedServer::start().await;
    let (client, mut events, mut accepted) = default_connected_client(&mut server).await;

    close_with(&mut accepted.socket, 4003).await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::TokenExpired(_))).await;

    client.disconnect();
    client.update_token("fresh-token");

    server.assert_no_connection().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

/// **VALUE**: `update_token` during a handshake restarts it with the new token in the URL.
///
/// **WHY THIS MATTERS**: The token rides in the upgrade URL. Letting the old handshake
/// finish would authenticate the path with a token the app already replaced.
///
/// **BUG THIS CATCHES**: Would catch only the auth frame picking up the new token.
#[tokio::test]
async fn given_handshake_in_flight_when_update_token_then_attempt_restarts_with_new_token() {
    // GIVEN: A listener that accepts TCP but never answers the first handshake
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let client = RealtimeClient::new(fast_params(&endpoint, TEST_TOKEN)).unwrap();

    let server_side = async {
        let (_stalled, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();

        // WHEN: The token changes while the client is still connecting
        assert_eq!(client.state(), ConnectionState::Connecting);
        client.update_token("rotated-token");

        // THEN: A second handshake arrives carrying the new token
        let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let mut accepted = upgrade(stream).await.expect("handshake should complete");
        assert!(
            accepted.uri.ends_with("token=rotated-token"),
            "uri was {}",
            accepted.uri
        );
        let auth = recv_json(&mut accepted.socket).await;
        assert_eq!(auth["token"], "rotated-token");
        accepted
    };

    let (result, _accepted) = tokio::join!(client.connect(), server_side);

    result.expect("connect() should resolve through the restarted attempt");
    assert!(client.is_connected());
}

// ============================================
// OWNERSHIP
// ============================================

/// **VALUE**: `replace` closes the previous client's socket before installing the new one.
///
/// **WHY THIS MATTERS**: Two live sockets for one user make the backend deliver results
/// twice.
///
/// **BUG THIS CATCHES**: Would catch the old connection task outliving its handle.
#[tokio::test]
async fn given_client_in_slot_when_replaced_then_old_socket_closed() {
    let mut server = ScriptedServer::start().await;
    let (client, _events, mut old) = default_connected_client(&mut server).await;
    let mut slot = Some(client);

    let replacement = RealtimeClient::replace(&mut slot, fast_params(&server.endpoint, "next"))
        .await
        .expect("replace should succeed");

    assert_eq!(replacement.state(), ConnectionState::Disconnected);
    assert_eq!(expect_client_close(&mut old.socket).await, Some(1000));
    server.assert_no_connection().await;
}

#[tokio::test]
async fn given_connected_client_when_dropped_then_socket_closed() {
    let mut server = ScriptedServer::start().await;
    let (client, _events, mut accepted) = default_connected_client(&mut server).await;

    drop(client);

    assert_eq!(expect_client_close(&mut accepted.socket).await, Some(1000));
}
