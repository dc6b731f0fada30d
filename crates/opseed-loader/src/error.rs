//! Loader and controller error types

use std::path::PathBuf;

use opseed_store::{ParseError, StoreError};

/// Failure before readiness. Readiness is never signaled after one of these.
#[derive(Debug)]
pub enum LoadError {
    /// The snapshot source could not be listed.
    Source { path: PathBuf, message: String },
    /// The operational session could not be started.
    Session(StoreError),
    /// A snapshot file is unreadable or malformed.
    Parse { path: PathBuf, source: ParseError },
    /// The store rejected a snapshot file's edit or commit.
    Apply { path: PathBuf, source: StoreError },
}

impl LoadError {
    /// The snapshot file that failed, if the failure belongs to one.
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            Self::Parse { path, .. } | Self::Apply { path, .. } => Some(path),
            Self::Source { .. } | Self::Session(_) => None,
        }
    }

    /// Short phase label for logs.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Source { .. } => "resolve",
            Self::Session(_) => "connect",
            Self::Parse { .. } => "parse",
            Self::Apply { .. } => "apply",
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source { path, message } => {
                write!(f, "cannot list snapshots in {}: {message}", path.display())
            }
            Self::Session(e) => write!(f, "cannot start operational session: {e}"),
            Self::Parse { path, source } => {
                write!(f, "parse {}: {source}", path.display())
            }
            Self::Apply { path, source } => {
                write!(f, "apply {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source { .. } => None,
            Self::Session(e) => Some(e),
            Self::Parse { source, .. } => Some(source),
            Self::Apply { source, .. } => Some(source),
        }
    }
}

/// Why the controller gave up.
#[derive(Debug)]
pub enum ControllerError {
    /// Loading failed; nothing was announced.
    Load(LoadError),
    /// Loading succeeded but the sync file could not be written.
    SyncFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The worker thread could not be started.
    Spawn(std::io::Error),
    /// The worker thread panicked.
    WorkerPanicked,
}

impl ControllerError {
    /// Process exit status for this failure.
    ///
    /// `1` load failure, `3` sync file, `2` anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Load(_) => 1,
            Self::SyncFile { .. } => 3,
            Self::Spawn(_) | Self::WorkerPanicked => 2,
        }
    }
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(e) => write!(f, "loading failed ({}): {e}", e.phase()),
            Self::SyncFile { path, source } => {
                write!(f, "cannot write sync file {}: {source}", path.display())
            }
            Self::Spawn(e) => write!(f, "cannot spawn worker thread: {e}"),
            Self::WorkerPanicked => write!(f, "worker thread panicked"),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::SyncFile { source, .. } | Self::Spawn(source) => Some(source),
            Self::WorkerPanicked => None,
        }
    }
}

impl From<LoadError> for ControllerError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}
