// Integration tests for error formatting
// Errors carry the source location where they were raised

use crate::helpers::{ScriptedServer, TEST_TOKEN, fast_params};

use realtime_core::error::config::ConfigError;
use realtime_core::{ClientConfig, RealtimeClient, RealtimeError};

/// **VALUE**: A failed connect reports its kind, message and source location.
///
/// **WHY THIS MATTERS**: Connection failures are read from user-submitted logs; the
/// location pins down which path produced them.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from Display.
#[tokio::test]
async fn given_failed_connect_when_error_displayed_then_includes_location() {
    let mut server = ScriptedServer::start().await;
    server.stop().await;
    let client = RealtimeClient::new(fast_params(&server.endpoint, TEST_TOKEN)).unwrap();

    let error = client.connect().await.expect_err("connect should fail");

    let text = error.to_string();
    assert!(text.starts_with("Transport Error:"), "{text}");
    assert!(text.contains(".rs:"), "{text}");
    assert!(!error.message().contains(".rs:"), "{}", error.message());
    assert!(error.is_retryable());
}

/// **VALUE**: Config validation errors name the offending field.
///
/// **BUG THIS CATCHES**: Would catch a generic "invalid config" message.
#[test]
fn given_invalid_config_when_validated_then_error_names_field() {
    let config = ClientConfig {
        max_reconnect_attempts: 0,
        ..ClientConfig::default()
    };

    let error = config.validate().expect_err("zero attempts should be rejected");

    assert!(matches!(error, ConfigError::ValidationError { .. }));
    let text = error.to_string();
    assert!(text.contains("max_reconnect_attempts"), "{text}");
    assert!(text.contains("Config Validation Error"), "{text}");
}

#[test]
fn given_client_outside_runtime_when_created_then_client_error() {
    let server_endpoint = "ws://127.0.0.1:9";

    let result = RealtimeClient::new(fast_params(server_endpoint, TEST_TOKEN));

    assert!(
        matches!(result, Err(RealtimeError::Client { .. })),
        "expected Client error outside a runtime"
    );
}
