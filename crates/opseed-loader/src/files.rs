//! Snapshot file discovery

use std::path::{Path, PathBuf};

use crate::config::SnapshotSource;
use crate::error::LoadError;

/// Resolve the ordered list of snapshot files to apply.
///
/// Directory sources are sorted by file name; an empty directory is not an
/// error (readiness then only means "nothing to seed").
pub fn resolve_snapshots(source: &SnapshotSource) -> Result<Vec<PathBuf>, LoadError> {
    match source {
        SnapshotSource::File(path) => Ok(vec![path.clone()]),
        SnapshotSource::Directory { path, pattern } => {
            let files = glob_dir(path, pattern)?;
            if files.is_empty() {
                log::warn!("no {pattern} files found in {}", path.display());
            } else {
                log::info!(
                    "{} files found in {}: {}",
                    files.len(),
                    path.display(),
                    files
                        .iter()
                        .map(|f| f.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            Ok(files)
        }
    }
}

fn glob_dir(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Source {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    // only `pattern` is glob syntax; the directory is matched literally
    let pattern_str = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files = Vec::new();
    let entries = glob::glob(&pattern_str).map_err(|e| LoadError::Source {
        path: dir.to_path_buf(),
        message: format!("invalid pattern {pattern}: {e}"),
    })?;
    for entry in entries {
        let path = entry.map_err(|e| LoadError::Source {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    // Later files overwrite earlier ones, so the order is part of the contract
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
