// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is read from a TOML file and includes:
//! - `api_url`: base address of the REST snapshot API
//! - `ws_url`: base address of the push channel
//! - `[reconnect]`: linear backoff tuning for the push channel
//! - `[http]`: request timeout for snapshot fetches
//!
//! The file is optional; every key has a default. `SENTINEL_API_URL` and
//! `SENTINEL_WS_URL` override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{ReconnectPolicy, SyncConfig};

const CONFIG_DIR_NAME: &str = "sentinel";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// REST base address, e.g. `http://localhost:8000/api`.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Push-channel base address, e.g. `ws://localhost:8000`.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Push-channel reconnection tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before retry attempt 1; attempt k waits k times this (default: 2000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Retry attempts before giving up (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Snapshot request tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            reconnect: ReconnectConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the given file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Resolves, loads, overrides, and validates the effective configuration.
    ///
    /// Lookup order for the file: `explicit`, then `SENTINEL_CONFIG`, then
    /// the user config directory. An explicitly named file must exist; the
    /// default location may be absent.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let config = match named {
            Some(path) => Config::load(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Config::load(&path)?,
                _ => Config::default(),
            },
        };

        let config = config.with_overrides(env::api_url(), env::ws_url());
        config.validate()?;
        Ok(config)
    }

    /// Replaces the base addresses with any provided overrides.
    pub fn with_overrides(mut self, api_url: Option<String>, ws_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(url) = ws_url {
            self.ws_url = url;
        }
        self
    }

    /// Checks URL schemes and reconnect parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid api_url '{}': must be http:// or https://",
                self.api_url
            )));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid ws_url '{}': must be ws:// or wss://",
                self.ws_url
            )));
        }
        if self.reconnect.base_delay_ms == 0 {
            return Err(Error::Config(
                "reconnect.base_delay_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// REST base address without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Push-channel base address without a trailing slash.
    pub fn ws_base(&self) -> &str {
        self.ws_url.trim_end_matches('/')
    }

    /// Timeout applied to each snapshot request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Reconnect policy described by the `[reconnect]` table.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect.base_delay_ms),
            self.reconnect.max_attempts,
        )
    }

    /// Settings handed to the sync controller.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            ws_base_url: self.ws_base().to_string(),
            policy: self.reconnect_policy(),
        }
    }
}

/// Default config file location (`<config_dir>/sentinel/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
