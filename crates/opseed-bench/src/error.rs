//! Benchmark errors

use std::path::PathBuf;

use opseed_core::StatsError;
use opseed_store::StoreError;

#[derive(Debug)]
pub enum BenchError {
    /// Datastore call failed
    Store(StoreError),
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Local file (raw request body) could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Not enough samples for a spread
    Stats(StatsError),
}

impl BenchError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io { path, source } => write!(f, "IO: {}: {source}", path.display()),
            Self::Stats(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            Self::Stats(e) => Some(e),
            Self::Http { .. } => None,
        }
    }
}

impl From<StoreError> for BenchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<StatsError> for BenchError {
    fn from(e: StatsError) -> Self {
        Self::Stats(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display() {
        let with_status = BenchError::Http {
            status: Some(404),
            message: "not found".into(),
        };
        assert_eq!(with_status.to_string(), "HTTP 404: not found");
        let without = BenchError::Http {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(without.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn stats_error_converts() {
        let err: BenchError = StatsError::InsufficientSamples { count: 1, ddof: 1 }.into();
        assert!(err.to_string().contains("got 1"));
    }
}
