// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! State directory and configuration management.
//!
//! Everything lives in one state directory:
//! - `config.toml`: remote endpoint and sync tuning
//! - `queue.jsonl`: the durable pending queue
//! - `queue.lock`: advisory lock guarding the queue file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ob_core::MAX_RETRY_ATTEMPTS;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::SyncConfig;

const APP_DIR_NAME: &str = "outbox";
const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_FILE_NAME: &str = "queue.jsonl";

/// Configuration stored in `<state dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote intake server (optional - if absent, entries only queue up).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    /// Sync engine tuning.
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Remote intake server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL: `ws://...` or `wss://...`.
    pub url: String,
    /// Max time to wait for the server's answer to one submission, in
    /// milliseconds (default: 10000).
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            submit_timeout_ms: default_submit_timeout_ms(),
        }
    }

    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let url = &self.url;
        let host = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"));
        match host {
            Some(rest) if !rest.is_empty() && !rest.starts_with('/') => None,
            Some(_) => Some(format!("invalid remote URL '{}': missing host", url)),
            None => Some(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                url
            )),
        }
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

/// Sync engine tuning. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Attempts before an entry needs manual action (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait after reconnecting before syncing, in milliseconds (default: 2000).
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Background sync period in seconds (default: 30).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Reachability probe period in milliseconds (default: 5000).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Reachability probe connect timeout in milliseconds (default: 2000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_attempts: default_max_attempts(),
            settle_delay_ms: default_settle_delay_ms(),
            interval_secs: default_interval_secs(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl SyncSettings {
    /// Coordinator configuration derived from these settings.
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            max_attempts: self.max_attempts,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            interval: Duration::from_secs(self.interval_secs),
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn default_submit_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    MAX_RETRY_ATTEMPTS
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_interval_secs() -> u64 {
    30
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Config {
    /// Loads configuration from the given state directory.
    ///
    /// A missing `config.toml` yields the defaults with no remote.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the given state directory.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Checks value ranges and the remote URL.
    pub fn validate(&self) -> Result<()> {
        if let Some(msg) = self.remote.as_ref().and_then(RemoteConfig::validate_url) {
            return Err(Error::Config(msg));
        }
        if self.sync.max_attempts == 0 {
            return Err(Error::Config("sync.max_attempts must be at least 1".into()));
        }
        if self.sync.interval_secs == 0 {
            return Err(Error::Config("sync.interval_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// The configured remote, or [`Error::NoRemote`].
    pub fn remote(&self) -> Result<&RemoteConfig> {
        self.remote.as_ref().ok_or(Error::NoRemote)
    }

    /// Returns the remote URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }
}

/// Resolve the state directory: explicit path, then `OUTBOX_DIR`, then
/// `$XDG_STATE_HOME/outbox`, then `~/.local/state/outbox`.
pub fn resolve_state_dir(explicit: Option<&Path>) -> PathBuf {
    pick_state_dir(
        explicit.map(Path::to_path_buf),
        env::outbox_dir(),
        env::xdg_state_home(),
        dirs::home_dir(),
    )
}

fn pick_state_dir(
    explicit: Option<PathBuf>,
    outbox_dir: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = explicit.or(outbox_dir) {
        return dir;
    }
    if let Some(dir) = xdg_state_home {
        return dir.join(APP_DIR_NAME);
    }
    home.map(|h| h.join(".local/state").join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".local/state").join(APP_DIR_NAME))
}

/// Path of the queue file inside a state directory.
pub fn queue_path(state_dir: &Path) -> PathBuf {
    state_dir.join(QUEUE_FILE_NAME)
}

/// Create the state directory and write `config.toml`.
///
/// Re-running keeps the existing settings; a given `remote` replaces the
/// configured one.
pub fn init_state_dir(state_dir: &Path, remote: Option<&str>) -> Result<Config> {
    fs::create_dir_all(state_dir)?;

    let mut config = Config::load(state_dir)?;
    if let Some(url) = remote {
        let timeout = config
            .remote
            .as_ref()
            .map_or_else(default_submit_timeout_ms, |r| r.submit_timeout_ms);
        config.remote = Some(RemoteConfig {
            url: url.to_string(),
            submit_timeout_ms: timeout,
        });
    }
    config.validate()?;
    config.save(state_dir)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
