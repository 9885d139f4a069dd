use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use scout_agent_client::configuration::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROLLER_URL, DEFAULT_RECONNECT_DELAY,
};
use scout_agent_client::SessionConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "scout.yaml";
pub const DEFAULT_LOG_FILE: &str = "scout.log";

/// Console settings as read from `scout.yaml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub url: String,
    pub reconnect_delay_ms: u64,
    pub connect_timeout_secs: u64,
    pub log_level: String,
    pub log_file: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CONTROLLER_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Load from `path`. A missing file is only an error when it was asked for
    /// explicitly; otherwise the defaults apply.
    pub async fn load<P: AsRef<Path>>(path: P, explicit: bool) -> Result<ConsoleConfig> {
        let path = path.as_ref();
        if !explicit && !tokio::fs::try_exists(path).await.unwrap_or(false) {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(ConsoleConfig::default());
        }

        Self::from_file(path).await
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ConsoleConfig> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<ConsoleConfig> {
        if content.trim().is_empty() {
            return Ok(ConsoleConfig::default());
        }

        let config: ConsoleConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;
        Ok(config)
    }

    /// Session settings for the client core. Fails on a non-websocket URL.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let config = SessionConfig::new(&self.url)?
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs));
        Ok(config)
    }
}
