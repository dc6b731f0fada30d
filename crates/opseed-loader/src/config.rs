//! Loader runtime configuration

use std::path::PathBuf;
use std::time::Duration;

/// Where snapshot files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Every file matching `pattern` directly under `path`, sorted by name.
    Directory { path: PathBuf, pattern: String },
    /// One explicit file.
    File(PathBuf),
}

impl Default for SnapshotSource {
    fn default() -> Self {
        Self::Directory {
            path: PathBuf::from("/yang-modules/operational/"),
            pattern: "*.xml".to_string(),
        }
    }
}

/// Runtime configuration for the loader
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SnapshotSource,
    /// Written with a UTC timestamp once every file is applied
    pub sync_file: Option<PathBuf>,
    /// How often the worker checks for stop and pings the session
    pub keepalive_interval: Duration,
    /// Log a heartbeat every this many intervals
    pub heartbeat_every: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SnapshotSource::default(),
            sync_file: None,
            keepalive_interval: Duration::from_secs(1),
            heartbeat_every: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(
            config.source,
            SnapshotSource::Directory {
                path: PathBuf::from("/yang-modules/operational/"),
                pattern: "*.xml".to_string(),
            }
        );
        assert!(config.sync_file.is_none());
        assert_eq!(config.keepalive_interval, Duration::from_secs(1));
        assert_eq!(config.heartbeat_every, 60);
    }
}
