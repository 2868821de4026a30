//! Client configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). The broker endpoint and the reconnect delay are the only
//! knobs of the bridge itself; the rest configures logging.

use std::time::Duration;

use crate::error::BridgeError;

/// Default rosbridge endpoint.
pub const DEFAULT_BRIDGE_URL: &str = "ws://localhost:9090";

/// Default delay before the single reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(50);

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Settings of a bridge connection and its reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Websocket URL of the rosbridge server (e.g. `ws://localhost:9090`).
    pub url: String,

    /// Fixed delay between a close and the single reconnect attempt.
    pub reconnect_delay: Duration,
}

impl BridgeConfig {
    /// Creates a config for `url` with the default reconnect delay.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Replaces the reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_URL)
    }
}

/// Top-level configuration of both binaries.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bridge endpoint and reconnect policy.
    pub bridge: BridgeConfig,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if `BRIDGE_URL` is not a
    /// `ws://` or `wss://` URL.
    pub fn from_env() -> Result<Self, BridgeError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Missing or unparseable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if `BRIDGE_URL` is not a
    /// `ws://` or `wss://` URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("BRIDGE_URL").unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(BridgeError::InvalidConfig {
                key: "BRIDGE_URL",
                reason: format!("expected a ws:// or wss:// url, got {url:?}"),
            });
        }

        let delay_ms = parse_value(
            lookup("RECONNECT_DELAY_MS"),
            u64::try_from(DEFAULT_RECONNECT_DELAY.as_millis()).unwrap_or(50_000),
        );

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            bridge: BridgeConfig::new(url).with_reconnect_delay(Duration::from_millis(delay_ms)),
            log_format,
        })
    }
}

/// Parses an optional raw value as `T`, returning `default` on missing
/// or invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
