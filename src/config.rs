use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::api::{SetWebhookParams, DEFAULT_API_URL};
use crate::transports::{PollingOptions, WebhookOptions};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default = "default_polling_config")]
    pub polling: PollingConfig,
    /// Present when updates should be pushed instead of polled.
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Deserialize, Clone)]
pub struct BotConfig {
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Long-poll timeout in seconds.
    #[serde(default = "default_polling_timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Pause after a failed round; 0 retries immediately.
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
    #[serde(default)]
    pub secret_token: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub drop_pending_updates: Option<bool>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_polling_timeout() -> u32 {
    30
}

fn default_error_backoff_secs() -> u64 {
    5
}

fn default_webhook_port() -> u16 {
    8080
}

fn default_polling_config() -> PollingConfig {
    PollingConfig {
        timeout: default_polling_timeout(),
        limit: None,
        error_backoff_secs: default_error_backoff_secs(),
    }
}

impl PollingConfig {
    pub fn options(&self) -> PollingOptions {
        PollingOptions {
            timeout: self.timeout,
            limit: self.limit,
        }
    }
}

impl WebhookConfig {
    pub fn options(&self) -> WebhookOptions {
        WebhookOptions {
            params: SetWebhookParams {
                url: self.url.clone(),
                ip_address: self.ip_address.clone(),
                max_connections: self.max_connections,
                drop_pending_updates: self.drop_pending_updates,
                secret_token: self.secret_token.clone(),
                ..SetWebhookParams::default()
            },
            port: Some(self.port),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        if config.bot.token.trim().is_empty() {
            anyhow::bail!("[bot] token must not be empty");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}
