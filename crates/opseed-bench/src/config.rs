//! Benchmark runtime configuration

use std::path::PathBuf;
use std::time::Duration;

/// Which backend to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// `get_data` on a local datastore session
    Store,
    /// HTTP GET (or raw POST) against a RESTCONF server
    Restconf,
}

impl BackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Restconf => "restconf",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestconfConfig {
    /// RESTCONF root, e.g. `https://localhost:8443/restconf`
    pub url: String,
    pub username: String,
    pub password: String,
    /// NMDA datastore to read from
    pub datastore: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Send this file's body as a POST instead of the GET
    pub raw_request: Option<PathBuf>,
}

impl Default for RestconfConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/restconf".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            datastore: "running".to_string(),
            timeout: Duration::from_secs(5),
            raw_request: None,
        }
    }
}

/// Runtime configuration for a benchmark run
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    /// Path to request
    pub path: String,
    /// Number of timed requests
    pub n: usize,
    /// Log each response body
    pub verbose: bool,
    /// Datastore directory for the `store` backend
    pub store_dir: PathBuf,
    pub restconf: RestconfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Store,
            path: "/".to_string(),
            n: 1000,
            verbose: false,
            store_dir: PathBuf::from("/var/lib/opseed"),
            restconf: RestconfConfig::default(),
        }
    }
}
