//! Sync file: readiness announced to other processes
//!
//! Holds one UTC timestamp, `2024-05-01 12:34:56.789012`, written once after
//! the last snapshot commit.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(WRITE_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), READ_FORMAT).map(|naive| naive.and_utc())
}

/// Write the timestamp, replacing any previous content.
///
/// Goes through a sibling `.tmp` file and a rename, so a reader polling for
/// the path never sees it empty. Parent directories are not created: an
/// unwritable location is an error for the caller to report.
pub fn write_sync_file(path: &Path, at: DateTime<Utc>) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    std::fs::write(&tmp, format_timestamp(at))?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a sync file back; `None` while it doesn't exist yet.
pub fn read_sync_file(path: &Path) -> std::io::Result<Option<DateTime<Utc>>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_timestamp(&content)
            .map(Some)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
