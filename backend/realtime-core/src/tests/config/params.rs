use crate::config::{ClientConfig, ConnectionParams};
use crate::error::config::ConfigError;

use common::RedactedToken;

use std::time::Duration;

fn params(endpoint: &str) -> ConnectionParams {
    ConnectionParams::builder()
        .with_endpoint(endpoint)
        .with_user_id("user-7")
        .with_token("tok-abc")
        .build()
        .expect("params should build")
}

/// **VALUE**: The socket URL is `{endpoint}/ws/{user}?token=...` with http mapped to ws.
///
/// **WHY THIS MATTERS**: The backend routes by this exact path and authenticates the
/// handshake from the query string.
///
/// **BUG THIS CATCHES**: Would catch a missing scheme mapping or a double slash in the path.
#[test]
fn given_http_endpoint_when_building_websocket_url_then_maps_scheme_and_path() {
    let url = params("http://localhost:8000").websocket_url().unwrap();

    assert_eq!(url.as_str(), "ws://localhost:8000/ws/user-7?token=tok-abc");
}

#[test]
fn given_https_endpoint_with_base_path_when_building_url_then_wss_and_path_kept() {
    let url = params("https://api.example.com/realtime/")
        .websocket_url()
        .unwrap();

    assert_eq!(url.scheme(), "wss");
    assert_eq!(url.path(), "/realtime/ws/user-7");
}

/// **VALUE**: The logged URL never contains the token.
///
/// **WHY THIS MATTERS**: Every connect attempt logs its URL at info level.
///
/// **BUG THIS CATCHES**: Would catch `log_safe_url` falling back to `websocket_url`.
#[test]
fn given_params_when_log_safe_url_then_token_hidden() {
    let logged = params("ws://127.0.0.1:8000").log_safe_url();

    assert!(!logged.contains("tok-abc"), "{logged}");
    assert!(logged.contains("REDACTED"), "{logged}");
    assert!(logged.contains("/ws/user-7"), "{logged}");
}

/// **VALUE**: User id and token are mandatory.
///
/// **BUG THIS CATCHES**: Would catch a blank user id producing `/ws/?token=`.
#[test]
fn given_missing_identity_when_building_then_validation_error() {
    let no_user = ConnectionParams::builder()
        .with_user_id("   ")
        .with_token("tok")
        .build();
    let no_token = ConnectionParams::builder()
        .with_user_id("user")
        .with_token(RedactedToken::new(""))
        .build();

    assert!(matches!(no_user, Err(ConfigError::ValidationError { .. })));
    assert!(matches!(no_token, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Params built from a config carry its tunables.
///
/// **BUG THIS CATCHES**: Would catch `from_config` ignoring a persisted field.
#[test]
fn given_config_when_building_params_then_tunables_copied() {
    let config = ClientConfig {
        auto_reconnect: false,
        reconnect_interval_ms: 750,
        max_reconnect_attempts: 2,
        auth_delay_ms: 0,
        ..ClientConfig::default()
    };

    let params =
        ConnectionParams::from_config(&config, "user-1", RedactedToken::new("t")).unwrap();

    assert!(!params.auto_reconnect());
    assert_eq!(params.reconnect_interval(), Duration::from_millis(750));
    assert_eq!(params.max_reconnect_attempts(), 2);
    assert_eq!(params.auth_delay(), Duration::ZERO);
    assert_eq!(params.user_id(), "user-1");
}
