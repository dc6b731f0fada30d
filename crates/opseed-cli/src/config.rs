//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for opseed
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub load: LoadConfig,
    pub bench: BenchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of the file datastore
    pub base_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/var/lib/opseed"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Snapshot directory
    pub path: PathBuf,
    /// Glob for snapshot files inside `path`
    pub pattern: String,
    pub sync_file: Option<PathBuf>,
    pub keepalive_ms: u64,
    pub heartbeat_every: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/yang-modules/operational/"),
            pattern: "*.xml".to_string(),
            sync_file: None,
            keepalive_ms: 1000,
            heartbeat_every: 60,
        }
    }
}

impl LoadConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Default request count
    pub n: usize,
    pub restconf: RestconfSection,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            n: 1000,
            restconf: RestconfSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestconfSection {
    pub url: String,
    pub username: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
    pub datastore: String,
    pub timeout_secs: u64,
}

impl Default for RestconfSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/restconf".to_string(),
            username: "admin".to_string(),
            password: std::env::var("OPSEED_RESTCONF_PASSWORD").ok(),
            datastore: "running".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./opseed.toml (current directory)
    /// 2. ~/.config/opseed/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("opseed.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "opseed") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
