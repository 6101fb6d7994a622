use crate::config::{ClientConfig, validate_delay, validate_endpoint, validate_reconnect};
use crate::error::config::ConfigError;

use common::{ErrorLocation, RedactedToken};

use std::panic::Location;
use std::time::Duration;

use url::Url;

const WEBSOCKET_PATH_SEGMENT: &str = "ws";
const TOKEN_QUERY_KEY: &str = "token";
const REDACTED_QUERY_VALUE: &str = "[REDACTED]";

/// Everything needed to open and keep the realtime connection.
///
/// Owned by the connection task. The token is the only field that changes after
/// construction (see [`RealtimeClient::update_token`](crate::RealtimeClient::update_token)).
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    endpoint: Url,
    user_id: String,
    token: RedactedToken,
    auto_reconnect: bool,
    reconnect_interval: Duration,
    max_reconnect_attempts: u32,
    auth_delay: Duration,
    rate_limit_close_delay: Duration,
}

impl ConnectionParams {
    pub fn builder() -> ConnectionParamsBuilder {
        ConnectionParamsBuilder::default()
    }

    /// Combine persisted tunables with the runtime identity.
    pub fn from_config(
        config: &ClientConfig,
        user_id: impl Into<String>,
        token: RedactedToken,
    ) -> Result<Self, ConfigError> {
        ConnectionParamsBuilder::from_config(config)
            .with_user_id(user_id)
            .with_token(token)
            .build()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &RedactedToken {
        &self.token
    }

    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    pub fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }

    pub fn auth_delay(&self) -> Duration {
        self.auth_delay
    }

    pub fn rate_limit_close_delay(&self) -> Duration {
        self.rate_limit_close_delay
    }

    pub(crate) fn set_token(&mut self, token: RedactedToken) {
        self.token = token;
    }

    /// `{endpoint}/ws/{user_id}?token=...` with http(s) mapped to ws(s).
    ///
    /// The token rides in the query string because the handshake cannot carry custom
    /// headers on every host transport.
    pub fn websocket_url(&self) -> Result<Url, ConfigError> {
        self.build_url(self.token.as_str())
    }

    /// Same as [`websocket_url`](Self::websocket_url) with the token masked, for logs.
    pub fn log_safe_url(&self) -> String {
        self.build_url(REDACTED_QUERY_VALUE)
            .map(String::from)
            .unwrap_or_else(|_| self.endpoint.to_string())
    }

    #[track_caller]
    fn build_url(&self, token: &str) -> Result<Url, ConfigError> {
        let mut url = self.endpoint.clone();

        let scheme = match url.scheme() {
            "http" => Some("ws"),
            "https" => Some("wss"),
            _ => None,
        };
        if let Some(scheme) = scheme {
            url.set_scheme(scheme).map_err(|_| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("cannot switch endpoint {} to {scheme}", self.endpoint),
            })?;
        }

        url.path_segments_mut()
            .map_err(|_| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("endpoint {} cannot carry a path", self.endpoint),
            })?
            .pop_if_empty()
            .push(WEBSOCKET_PATH_SEGMENT)
            .push(&self.user_id);

        url.query_pairs_mut().append_pair(TOKEN_QUERY_KEY, token);

        Ok(url)
    }
}

/// Builder for validated [`ConnectionParams`].
#[derive(Debug, Default)]
pub struct ConnectionParamsBuilder {
    endpoint: Option<String>,
    user_id: Option<String>,
    token: Option<RedactedToken>,
    auto_reconnect: Option<bool>,
    reconnect_interval: Option<Duration>,
    max_reconnect_attempts: Option<u32>,
    auth_delay: Option<Duration>,
    rate_limit_close_delay: Option<Duration>,
}

impl ConnectionParamsBuilder {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .with_endpoint(config.endpoint.clone())
            .with_auto_reconnect(config.auto_reconnect)
            .with_reconnect_interval(Duration::from_millis(config.reconnect_interval_ms))
            .with_max_reconnect_attempts(config.max_reconnect_attempts)
            .with_auth_delay(Duration::from_millis(config.auth_delay_ms))
            .with_rate_limit_close_delay(Duration::from_millis(config.rate_limit_close_delay_ms))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<RedactedToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = Some(enabled);
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = Some(interval);
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = Some(delay);
        self
    }

    pub fn with_rate_limit_close_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_close_delay = Some(delay);
        self
    }

    /// Validate and produce the parameters. Unset tunables fall back to
    /// [`ClientConfig::default`]; user id and token are mandatory.
    #[track_caller]
    pub fn build(self) -> Result<ConnectionParams, ConfigError> {
        let defaults = ClientConfig::default();

        let endpoint = validate_endpoint(self.endpoint.as_deref().unwrap_or(&defaults.endpoint))?;

        let user_id = self
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("user id is required"),
            })?;

        let token = self
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("bearer token is required"),
            })?;

        let reconnect_interval = self
            .reconnect_interval
            .unwrap_or(Duration::from_millis(defaults.reconnect_interval_ms));
        let max_reconnect_attempts = self
            .max_reconnect_attempts
            .unwrap_or(defaults.max_reconnect_attempts);
        validate_reconnect(duration_ms(reconnect_interval), max_reconnect_attempts)?;

        let auth_delay = self
            .auth_delay
            .unwrap_or(Duration::from_millis(defaults.auth_delay_ms));
        validate_delay("auth_delay", duration_ms(auth_delay))?;

        let rate_limit_close_delay = self
            .rate_limit_close_delay
            .unwrap_or(Duration::from_millis(defaults.rate_limit_close_delay_ms));
        validate_delay("rate_limit_close_delay", duration_ms(rate_limit_close_delay))?;

        Ok(ConnectionParams {
            endpoint,
            user_id,
            token,
            auto_reconnect: self.auto_reconnect.unwrap_or(defaults.auto_reconnect),
            reconnect_interval,
            max_reconnect_attempts,
            auth_delay,
            rate_limit_close_delay,
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
