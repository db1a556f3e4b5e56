// Configuration management for the actorlink CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/actorlink/config.json
// - Linux: ~/.config/actorlink/config.json
// - Windows: %APPDATA%\actorlink\config.json

use actorlink_core::client::DEFAULT_ENDPOINT;
use actorlink_core::{ClientConfig, HttpTransport, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote actor endpoint
    pub endpoint: String,

    /// Pause between successful polls, in milliseconds
    pub poll_interval_ms: u64,

    /// Pause before retrying a failed exchange, in milliseconds
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds (0 = none)
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: 0,
            retry_delay_ms: 0,
            request_timeout_secs: 0,
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("actorlink");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if config_file.exists() {
            let contents =
                std::fs::read_to_string(&config_file).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let config_file = Self::config_file()?;
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_file, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Set a config value and persist it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Set a config value in memory only
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endpoint" => {
                if value.is_empty() {
                    anyhow::bail!("Endpoint must not be empty");
                }
                self.endpoint = value.to_string();
            }
            "poll_interval_ms" => {
                self.poll_interval_ms = value.parse().context("Invalid number")?;
            }
            "retry_delay_ms" => {
                self.retry_delay_ms = value.parse().context("Invalid number")?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = value.parse().context("Invalid number")?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "endpoint" => Some(self.endpoint.clone()),
            "poll_interval_ms" => Some(self.poll_interval_ms.to_string()),
            "retry_delay_ms" => Some(self.retry_delay_ms.to_string()),
            "request_timeout_secs" => Some(self.request_timeout_secs.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("endpoint".to_string(), self.endpoint.clone()),
            ("poll_interval_ms".to_string(), format!("{}ms", self.poll_interval_ms)),
            ("retry_delay_ms".to_string(), format!("{}ms", self.retry_delay_ms)),
            (
                "request_timeout_secs".to_string(),
                if self.request_timeout_secs == 0 {
                    "(none)".to_string()
                } else {
                    format!("{}s", self.request_timeout_secs)
                },
            ),
        ]
    }

    /// Client settings derived from this config
    pub fn client_config(&self) -> ClientConfig {
        let retry = RetryPolicy::forever().with_delay(Duration::from_millis(self.retry_delay_ms));
        ClientConfig::new(self.endpoint.clone())
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_discovery_retry(retry)
            .with_poll_retry(retry)
    }

    pub fn transport(&self) -> HttpTransport {
        match self.request_timeout_secs {
            0 => HttpTransport::new(),
            secs => HttpTransport::new().with_timeout(Duration::from_secs(secs)),
        }
    }
}
