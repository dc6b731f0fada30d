//! Error types for snapshot parsing and datastore access

use std::path::{Path, PathBuf};

/// A snapshot file could not be read or is not well-formed.
#[derive(Debug)]
pub enum ParseError {
    /// The file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The content is not a well-formed data tree.
    Malformed {
        path: Option<PathBuf>,
        position: u64,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: None,
            position,
            message: message.into(),
        }
    }

    /// Attach the file the content came from.
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            Self::Malformed {
                position, message, ..
            } => Self::Malformed {
                path: Some(file.to_path_buf()),
                position,
                message,
            },
            other => other,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Malformed {
                path: Some(path),
                position,
                message,
            } => write!(f, "{}: byte {position}: {message}", path.display()),
            Self::Malformed {
                path: None,
                position,
                message,
            } => write!(f, "byte {position}: {message}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } => None,
        }
    }
}

/// The datastore refused an operation or could not be reached.
#[derive(Debug)]
pub enum StoreError {
    /// The backend rejected an edit or commit (validation, schema mismatch).
    Rejected { message: String },
    /// The backend is not reachable.
    Unavailable { message: String },
    /// The session no longer exists on the backend side.
    SessionLost { session: String },
    /// The session was already stopped.
    Stopped { session: String },
    /// Backend storage could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Backend storage holds unreadable content.
    Corrupt { path: PathBuf, message: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { message } => write!(f, "change rejected: {message}"),
            Self::Unavailable { message } => write!(f, "datastore unavailable: {message}"),
            Self::SessionLost { session } => write!(f, "session {session} lost"),
            Self::Stopped { session } => write!(f, "session {session} already stopped"),
            Self::Io { path, source } => write!(f, "IO: {}: {source}", path.display()),
            Self::Corrupt { path, message } => {
                write!(f, "corrupt datastore file {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
