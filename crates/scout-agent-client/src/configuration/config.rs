use std::time::Duration;

use url::Url;

use crate::error::TransportError;

/// Controller endpoint used when none is configured.
pub const DEFAULT_CONTROLLER_URL: &str = "ws://127.0.0.1:7860/ws";

/// Fixed delay between a session closing and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// How long a single connection attempt may take before it counts as failed.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one session manager.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CONTROLLER_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Create a config for the given controller URL, which must use the `ws`
    /// or `wss` scheme.
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(url)?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(TransportError::InvalidUrl(format!(
                "URL must use ws:// or wss:// scheme, got: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            url: parsed.to_string(),
            ..Self::default()
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
