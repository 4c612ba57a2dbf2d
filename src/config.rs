//! Client configuration and participant identity.
//!
//! Identity is never looked up ambiently: the shell that logged the
//! participant in builds an [`Identity`] and hands it to the session. Tunables
//! come from environment variables via [`ClientConfig::from_env`].

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_BROKER_URL: &str = "ws://127.0.0.1:9001/";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is set to something unparseable.
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Who this client is within which session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub session_id: String,
    pub participant_id: String,
    pub username: String,
}

impl Identity {
    #[must_use]
    pub fn new(session_id: impl Into<String>, participant_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), participant_id: participant_id.into(), username: username.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the session REST API, without trailing slash.
    pub api_url: String,
    /// Pub/sub broker endpoint handed to the transport.
    pub broker_url: String,
    /// Overall HTTP request timeout. `None` leaves requests unbounded.
    pub http_timeout: Option<Duration>,
    /// Clear the peer map whenever a new question is set up.
    pub evict_peers_on_setup: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            broker_url: DEFAULT_BROKER_URL.to_owned(),
            http_timeout: None,
            evict_peers_on_setup: false,
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SWARM_API_URL`: default `http://127.0.0.1:5000`
    /// - `SWARM_BROKER_URL`: default `ws://127.0.0.1:9001/`
    /// - `SWARM_HTTP_TIMEOUT_SECS`: unset means no timeout
    /// - `SWARM_EVICT_PEERS_ON_SETUP`: `true`/`false`, default `false`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparseable numbers or flags.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("SWARM_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let broker_url = std::env::var("SWARM_BROKER_URL").unwrap_or_else(|_| DEFAULT_BROKER_URL.to_owned());
        let http_timeout = match std::env::var("SWARM_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(parse_secs("SWARM_HTTP_TIMEOUT_SECS", &raw)?)),
            Err(_) => None,
        };
        let evict_peers_on_setup = match std::env::var("SWARM_EVICT_PEERS_ON_SETUP") {
            Ok(raw) => parse_flag("SWARM_EVICT_PEERS_ON_SETUP", &raw)?,
            Err(_) => false,
        };

        Ok(Self { api_url, broker_url, http_timeout, evict_peers_on_setup })
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue { var, value: raw.to_owned() })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: raw.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
