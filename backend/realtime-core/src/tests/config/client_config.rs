use crate::config::ClientConfig;
use crate::error::config::ConfigError;

use std::fs;

use tempfile::TempDir;

/// **VALUE**: A missing config file yields defaults, not an error.
///
/// **WHY THIS MATTERS**: First launch has no `realtime.json`; the client must still start.
///
/// **BUG THIS CATCHES**: Would catch `load` surfacing a NotFound read error.
#[test]
fn given_missing_file_when_load_then_returns_defaults() {
    let dir = TempDir::new().unwrap();

    let config = ClientConfig::load(dir.path()).expect("missing file should load defaults");

    assert_eq!(config, ClientConfig::default());
    assert!(config.auto_reconnect);
    assert_eq!(config.reconnect_interval_ms, 3_000);
    assert_eq!(config.max_reconnect_attempts, 5);
}

/// **VALUE**: Save then load returns the same values.
///
/// **WHY THIS MATTERS**: Tuned reconnect settings must survive a restart.
///
/// **BUG THIS CATCHES**: Would catch the temp file never being renamed into place.
#[test]
fn given_saved_config_when_loaded_then_values_persist() {
    let dir = TempDir::new().unwrap();
    let config = ClientConfig {
        endpoint: "https://api.example.com".to_string(),
        reconnect_interval_ms: 500,
        max_reconnect_attempts: 8,
        ..ClientConfig::default()
    };

    config.save(dir.path()).expect("save should succeed");
    let loaded = ClientConfig::load(dir.path()).expect("load should succeed");

    assert_eq!(loaded, config);
    assert!(!dir.path().join("realtime.json.tmp").exists());
}

/// **VALUE**: A partial file fills the gaps with defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` on a new field.
#[test]
fn given_partial_file_when_load_then_missing_fields_default() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("realtime.json"),
        r#"{"auto_reconnect": false}"#,
    )
    .unwrap();

    let config = ClientConfig::load(dir.path()).unwrap();

    assert!(!config.auto_reconnect);
    assert_eq!(config.auth_delay_ms, 100);
    assert_eq!(config.rate_limit_close_delay_ms, 1_000);
}

/// **VALUE**: Corrupt JSON is a parse error, not silent defaults.
///
/// **WHY THIS MATTERS**: Silently replacing a hand-edited file with defaults hides the typo.
///
/// **BUG THIS CATCHES**: Would catch parse errors being swallowed.
#[test]
fn given_corrupt_file_when_load_then_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("realtime.json"), "{ not json").unwrap();

    let result = ClientConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Out-of-range values are rejected on validate and on save.
///
/// **BUG THIS CATCHES**: Would catch a zero interval (busy reconnect loop) being accepted.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    let zero_interval = ClientConfig {
        reconnect_interval_ms: 0,
        ..ClientConfig::default()
    };
    let bad_scheme = ClientConfig {
        endpoint: "ftp://files.example.com".to_string(),
        ..ClientConfig::default()
    };
    let too_many = ClientConfig {
        max_reconnect_attempts: 1_000,
        ..ClientConfig::default()
    };

    for config in [zero_interval, bad_scheme, too_many] {
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "{config:?} should be rejected"
        );
    }

    let dir = TempDir::new().unwrap();
    let invalid = ClientConfig {
        auth_delay_ms: 120_000,
        ..ClientConfig::default()
    };
    assert!(invalid.save(dir.path()).is_err());
    assert!(!dir.path().join("realtime.json").exists());
}
