//! Configuration stored in ~/.reviewkit/config.json
//!
//! Every field has a serde default so a partial (or absent) file loads
//! cleanly; unknown fields are ignored for forward compatibility.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Report owner; also the key the remote daily-record store is queried by.
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_job: String,
    /// Base URL of the daily-record persistence service.
    #[serde(default = "default_records_api_base")]
    pub records_api_base: String,
    /// Base URL of the Jira forwarding proxy.
    #[serde(default = "default_jira_proxy_base")]
    pub jira_proxy_base: String,
    /// Artificial delay before the template generator resolves, in
    /// milliseconds. 0 disables.
    #[serde(default = "default_simulate_latency_ms")]
    pub simulate_latency_ms: u64,
}

fn default_records_api_base() -> String {
    "http://localhost:8787".to_string()
}

fn default_jira_proxy_base() -> String {
    "http://localhost:3001".to_string()
}

fn default_simulate_latency_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            user_job: String::new(),
            records_api_base: default_records_api_base(),
            jira_proxy_base: default_jira_proxy_base(),
            simulate_latency_ms: default_simulate_latency_ms(),
        }
    }
}

/// The app data directory (~/.reviewkit), created on demand.
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "home directory not found",
        ))
    })?;
    let dir = home.join(".reviewkit");
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Canonical config file path (~/.reviewkit/config.json).
pub fn config_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

/// Load config from the canonical path, then apply env overrides
/// (`REVIEWKIT_API_BASE`, `REVIEWKIT_PROXY_BASE`). A missing file yields
/// the defaults.
pub fn load_config() -> Result<Config> {
    let mut config = load_config_from(&config_path()?)?;

    if let Ok(base) = std::env::var("REVIEWKIT_API_BASE") {
        if !base.is_empty() {
            config.records_api_base = base;
        }
    }
    if let Ok(base) = std::env::var("REVIEWKIT_PROXY_BASE") {
        if !base.is_empty() {
            config.jira_proxy_base = base;
        }
    }

    Ok(config)
}

pub fn load_config_from(path: &std::path::Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write config as pretty JSON to the canonical path.
pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&config_path()?, config)
}

pub fn save_config_to(path: &std::path::Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
