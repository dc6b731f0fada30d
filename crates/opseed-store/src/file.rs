//! Directory-backed datastore shared between processes
//!
//! Directory layout:
//! ```text
//! {base}/
//! ├── running.json            # running datastore
//! └── operational/
//!     └── {session-id}.json   # one per live operational session
//! ```
//!
//! The operational view is the running datastore overlaid with every live
//! session's contribution. Stopping a session deletes its file, so its data
//! disappears from the view, which is why a seeding process has to keep its
//! session open.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::session::{Datastore, DatastoreKind, Session};
use crate::tree::DataTree;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// On-disk record of one operational session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session: String,
    data: DataTree,
}

/// Connection to a directory-backed datastore.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the datastore rooted at `base`.
    pub fn connect(base: &Path) -> Result<Self, StoreError> {
        let oper = base.join("operational");
        fs::create_dir_all(&oper).map_err(|e| StoreError::io(&oper, e))?;
        log::debug!("connected to datastore at {}", base.display());
        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    /// Read a datastore without opening a session.
    pub fn read(&self, kind: DatastoreKind, xpath: &str) -> Result<DataTree, StoreError> {
        read_datastore(&self.base, kind, xpath)
    }

    /// Identifiers of sessions with a live operational contribution.
    pub fn live_sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(session_files(&self.base)?
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect())
    }
}

impl Datastore for FileStore {
    type Session = FileSession;

    fn start_session(&self, kind: DatastoreKind) -> Result<FileSession, StoreError> {
        if !self.base.is_dir() {
            return Err(StoreError::Unavailable {
                message: format!("{} does not exist", self.base.display()),
            });
        }
        let id = format!(
            "{}-{}",
            std::process::id(),
            NEXT_SESSION.fetch_add(1, Ordering::Relaxed)
        );
        let session = FileSession {
            id,
            kind,
            base: self.base.clone(),
            staged: None,
            committed: DataTree::new(),
            stopped: false,
        };
        if kind == DatastoreKind::Operational {
            session.write_session_file(&session.committed)?;
        }
        log::debug!("started {kind} session {}", session.id);
        Ok(session)
    }
}

/// Session on a [`FileStore`].
#[derive(Debug)]
pub struct FileSession {
    id: String,
    kind: DatastoreKind,
    base: PathBuf,
    staged: Option<DataTree>,
    committed: DataTree,
    stopped: bool,
}

impl FileSession {
    fn session_path(&self) -> PathBuf {
        operational_dir(&self.base).join(format!("{}.json", self.id))
    }

    fn ensure_live(&self) -> Result<(), StoreError> {
        if self.stopped {
            return Err(StoreError::Stopped {
                session: self.id.clone(),
            });
        }
        Ok(())
    }

    fn write_session_file(&self, data: &DataTree) -> Result<(), StoreError> {
        let record = SessionFile {
            session: self.id.clone(),
            data: data.clone(),
        };
        write_json_atomic(&self.session_path(), &record)
    }

    fn commit_operational(&mut self, staged: &DataTree) -> Result<(), StoreError> {
        let path = self.session_path();
        if !path.exists() {
            return Err(StoreError::SessionLost {
                session: self.id.clone(),
            });
        }
        let mut next = self.committed.clone();
        next.merge(staged);
        self.write_session_file(&next)?;
        self.committed = next;
        Ok(())
    }

    fn commit_running(&self, staged: &DataTree) -> Result<(), StoreError> {
        let path = running_path(&self.base);
        let mut running: DataTree = read_json(&path)?.unwrap_or_default();
        running.merge(staged);
        write_json_atomic(&path, &running)
    }

    fn release(&mut self) -> Result<(), StoreError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.staged = None;
        if self.kind == DatastoreKind::Operational {
            let path = self.session_path();
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        log::debug!("stopped {} session {}", self.kind, self.id);
        Ok(())
    }
}

impl Session for FileSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn datastore(&self) -> DatastoreKind {
        self.kind
    }

    fn edit_batch(&mut self, tree: &DataTree) -> Result<(), StoreError> {
        self.ensure_live()?;
        self.staged.get_or_insert_with(DataTree::new).merge(tree);
        Ok(())
    }

    fn apply_changes(&mut self) -> Result<(), StoreError> {
        self.ensure_live()?;
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };
        match self.kind {
            DatastoreKind::Operational => self.commit_operational(&staged),
            DatastoreKind::Running => self.commit_running(&staged),
        }
    }

    fn discard_changes(&mut self) {
        self.staged = None;
    }

    fn get_data(&self, xpath: &str) -> Result<DataTree, StoreError> {
        self.ensure_live()?;
        read_datastore(&self.base, self.kind, xpath)
    }

    fn keepalive(&self) -> Result<(), StoreError> {
        self.ensure_live()?;
        let (path, lost) = match self.kind {
            DatastoreKind::Operational => (
                self.session_path(),
                StoreError::SessionLost {
                    session: self.id.clone(),
                },
            ),
            DatastoreKind::Running => (
                self.base.clone(),
                StoreError::Unavailable {
                    message: format!("{} disappeared", self.base.display()),
                },
            ),
        };
        match fs::metadata(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(lost),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn stop(mut self) -> Result<(), StoreError> {
        self.release()
    }
}

impl Drop for FileSession {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release session {}: {e}", self.id);
        }
    }
}

fn running_path(base: &Path) -> PathBuf {
    base.join("running.json")
}

fn operational_dir(base: &Path) -> PathBuf {
    base.join("operational")
}

/// Live session files, sorted for a deterministic overlay order.
fn session_files(base: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let dir = operational_dir(base);
    // the base directory is matched literally
    let pattern_str = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern_str)
        .map_err(|e| StoreError::Corrupt {
            path: dir.clone(),
            message: e.to_string(),
        })?
        .filter_map(|e| e.ok())
        .collect();
    files.sort();
    Ok(files)
}

fn read_datastore(base: &Path, kind: DatastoreKind, xpath: &str) -> Result<DataTree, StoreError> {
    let mut view: DataTree = read_json(&running_path(base))?.unwrap_or_default();
    if kind == DatastoreKind::Operational {
        for path in session_files(base)? {
            // a session may stop between listing and reading
            if let Some(record) = read_json::<SessionFile>(&path)? {
                log::trace!("overlaying session {}", record.session);
                view.merge(&record.data);
            }
        }
    }
    Ok(view.subtree(xpath))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write via a sibling `.tmp` file and rename, so readers never see a
/// half-written document.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
