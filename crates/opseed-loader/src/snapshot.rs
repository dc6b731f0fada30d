//! Apply snapshot files to an operational session

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use opseed_store::{Session, parse_snapshot_file};

use crate::error::LoadError;

/// Proof that every snapshot file was applied and committed.
///
/// Only [`SnapshotLoader::load`] creates one, and the readiness notifier
/// consumes one, so readiness cannot be announced without a full load.
#[derive(Debug)]
pub struct LoadReport {
    files: usize,
    leaves: usize,
    elapsed: Duration,
    finished_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn files(&self) -> usize {
        self.files
    }

    /// Leaves applied, summed over files (overwrites counted each time).
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Taken after the last commit was acknowledged.
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

/// Sequential snapshot applier.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    files: Vec<PathBuf>,
}

impl SnapshotLoader {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Parse, stage and commit each file in order.
    ///
    /// Stops at the first failure; later files are not touched. A file whose
    /// commit fails leaves nothing behind since its staged batch is dropped.
    pub fn load<S: Session>(&self, session: &mut S) -> Result<LoadReport, LoadError> {
        let start = Instant::now();
        let mut leaves = 0usize;

        for path in &self.files {
            log::debug!("opening {}", path.display());
            let tree = parse_snapshot_file(path).map_err(|e| LoadError::Parse {
                path: path.clone(),
                source: e,
            })?;

            let applied = session
                .edit_batch(&tree)
                .and_then(|()| session.apply_changes());
            if let Err(e) = applied {
                session.discard_changes();
                return Err(LoadError::Apply {
                    path: path.clone(),
                    source: e,
                });
            }

            log::debug!("{}: {} leaves applied", path.display(), tree.len());
            leaves += tree.len();
        }

        Ok(LoadReport {
            files: self.files.len(),
            leaves,
            elapsed: start.elapsed(),
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opseed_store::{Datastore, DatastoreKind, Fault, MemoryStore, StoreEvent};
    use std::path::Path;

    fn write(dir: &Path, name: &str, xml: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, xml).unwrap();
        path
    }

    #[test]
    fn applies_in_order_later_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.xml", "<sys><mode>a</mode><only-a>1</only-a></sys>");
        let b = write(dir.path(), "b.xml", "<sys><mode>b</mode></sys>");

        let store = MemoryStore::new();
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        let report = SnapshotLoader::new(vec![a, b]).load(&mut sess).unwrap();

        assert_eq!(report.files(), 2);
        assert_eq!(report.leaves(), 3);
        let view = store.read(DatastoreKind::Operational, "/sys");
        assert_eq!(view.get("/sys/mode"), Some("b"));
        assert_eq!(view.get("/sys/only-a"), Some("1"));
        assert_eq!(store.commit_count(), 2);
    }

    #[test]
    fn parse_failure_stops_before_later_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.xml", "<x>1</x>");
        let b = write(dir.path(), "b.xml", "<x>");
        let c = write(dir.path(), "c.xml", "<y>3</y>");

        let store = MemoryStore::new();
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        let err = SnapshotLoader::new(vec![a, b.clone(), c])
            .load(&mut sess)
            .unwrap_err();

        assert!(matches!(err, LoadError::Parse { .. }));
        assert_eq!(err.file(), Some(b.as_path()));
        // only a.xml went through
        assert_eq!(store.commit_count(), 1);
        assert!(store.read(DatastoreKind::Operational, "/y").is_empty());
    }

    #[test]
    fn rejected_commit_stops_and_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.xml", "<ok>1</ok>");
        let b = write(dir.path(), "b.xml", "<fine>2</fine><bad>3</bad>");
        let c = write(dir.path(), "c.xml", "<late>4</late>");

        let store = MemoryStore::new();
        store.inject(Fault::RejectPath("/bad".into()));
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        let err = SnapshotLoader::new(vec![a, b, c]).load(&mut sess).unwrap_err();

        assert_eq!(err.phase(), "apply");
        let view = store.read(DatastoreKind::Operational, "/");
        assert_eq!(view.get("/ok"), Some("1"));
        assert!(view.get("/fine").is_none());
        assert!(view.get("/late").is_none());
        let edits = store
            .events()
            .iter()
            .filter(|e| matches!(e, StoreEvent::EditBatch { .. }))
            .count();
        assert_eq!(edits, 2);
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let store = MemoryStore::new();
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        let err = SnapshotLoader::new(vec![PathBuf::from("/definitely/missing.xml")])
            .load(&mut sess)
            .unwrap_err();
        assert_eq!(err.phase(), "parse");
        assert!(err.to_string().contains("missing.xml"));
    }

    #[test]
    fn no_files_is_an_empty_report() {
        let store = MemoryStore::new();
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        let report = SnapshotLoader::new(vec![]).load(&mut sess).unwrap();
        assert_eq!(report.files(), 0);
        assert_eq!(store.commit_count(), 0);
    }
}
