//! In-process datastore with call recording and fault injection
//!
//! Behaves like [`FileStore`](crate::FileStore) (staged batches, per-session
//! operational data, release on drop) without touching the filesystem.
//! Clones share state, so a test can keep one handle while a worker thread
//! owns another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::session::{Datastore, DatastoreKind, Session};
use crate::tree::DataTree;

/// One recorded call against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    SessionStarted { session: String },
    EditBatch { session: String, leaves: usize },
    Committed { session: String, leaves: usize },
    CommitRejected { session: String },
    KeepAlive { session: String, ok: bool },
    SessionStopped { session: String },
}

/// Failure modes a test can switch on.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Reject any commit whose batch touches a path containing this fragment.
    RejectPath(String),
    /// Fail the next `n` keep-alives with [`StoreError::Unavailable`].
    KeepAliveOutage(usize),
    /// Refuse new sessions.
    Unavailable,
    /// Sleep this long inside every commit.
    CommitDelay(Duration),
}

#[derive(Debug, Default)]
struct MemoryState {
    running: DataTree,
    operational: BTreeMap<String, DataTree>,
    events: Vec<StoreEvent>,
    next_id: u64,
    reject_paths: Vec<String>,
    keepalive_failures: usize,
    unavailable: bool,
    commit_delay: Duration,
    last_commit_at: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn view(&self, kind: DatastoreKind) -> DataTree {
        let mut view = self.running.clone();
        if kind == DatastoreKind::Operational {
            for data in self.operational.values() {
                view.merge(data);
            }
        }
        view
    }
}

/// Shared handle to an in-memory datastore.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn inject(&self, fault: Fault) {
        let mut state = self.state();
        match fault {
            Fault::RejectPath(fragment) => state.reject_paths.push(fragment),
            Fault::KeepAliveOutage(n) => state.keepalive_failures += n,
            Fault::Unavailable => state.unavailable = true,
            Fault::CommitDelay(d) => state.commit_delay = d,
        }
    }

    /// Every call recorded so far, in order.
    pub fn events(&self) -> Vec<StoreEvent> {
        self.state().events.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| matches!(e, StoreEvent::Committed { .. }))
            .count()
    }

    /// Wall-clock time of the most recent successful commit.
    pub fn last_commit_at(&self) -> Option<DateTime<Utc>> {
        self.state().last_commit_at
    }

    pub fn live_sessions(&self) -> Vec<String> {
        self.state().operational.keys().cloned().collect()
    }

    pub fn read(&self, kind: DatastoreKind, xpath: &str) -> DataTree {
        self.state().view(kind).subtree(xpath)
    }
}

impl Datastore for MemoryStore {
    type Session = MemorySession;

    fn start_session(&self, kind: DatastoreKind) -> Result<MemorySession, StoreError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(StoreError::Unavailable {
                message: "memory store marked unavailable".to_string(),
            });
        }
        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);
        if kind == DatastoreKind::Operational {
            state.operational.insert(id.clone(), DataTree::new());
        }
        state.events.push(StoreEvent::SessionStarted {
            session: id.clone(),
        });
        Ok(MemorySession {
            id,
            kind,
            store: self.clone(),
            staged: None,
            stopped: false,
        })
    }
}

/// Session on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    id: String,
    kind: DatastoreKind,
    store: MemoryStore,
    staged: Option<DataTree>,
    stopped: bool,
}

impl MemorySession {
    fn ensure_live(&self) -> Result<(), StoreError> {
        if self.stopped {
            return Err(StoreError::Stopped {
                session: self.id.clone(),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.staged = None;
        let mut state = self.store.state();
        state.operational.remove(&self.id);
        state.events.push(StoreEvent::SessionStopped {
            session: self.id.clone(),
        });
    }
}

impl Session for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn datastore(&self) -> DatastoreKind {
        self.kind
    }

    fn edit_batch(&mut self, tree: &DataTree) -> Result<(), StoreError> {
        self.ensure_live()?;
        self.staged.get_or_insert_with(DataTree::new).merge(tree);
        self.store.state().events.push(StoreEvent::EditBatch {
            session: self.id.clone(),
            leaves: tree.len(),
        });
        Ok(())
    }

    fn apply_changes(&mut self) -> Result<(), StoreError> {
        self.ensure_live()?;
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };

        let delay = self.store.state().commit_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.store.state();
        let rejected = state
            .reject_paths
            .iter()
            .find(|fragment| staged.iter().any(|(path, _)| path.contains(fragment.as_str())))
            .cloned();
        if let Some(fragment) = rejected {
            state.events.push(StoreEvent::CommitRejected {
                session: self.id.clone(),
            });
            return Err(StoreError::Rejected {
                message: format!("validation failed for data under '{fragment}'"),
            });
        }

        match self.kind {
            DatastoreKind::Operational => {
                let Some(data) = state.operational.get_mut(&self.id) else {
                    return Err(StoreError::SessionLost {
                        session: self.id.clone(),
                    });
                };
                data.merge(&staged);
            }
            DatastoreKind::Running => state.running.merge(&staged),
        }
        state.events.push(StoreEvent::Committed {
            session: self.id.clone(),
            leaves: staged.len(),
        });
        state.last_commit_at = Some(Utc::now());
        Ok(())
    }

    fn discard_changes(&mut self) {
        self.staged = None;
    }

    fn get_data(&self, xpath: &str) -> Result<DataTree, StoreError> {
        self.ensure_live()?;
        Ok(self.store.read(self.kind, xpath))
    }

    fn keepalive(&self) -> Result<(), StoreError> {
        self.ensure_live()?;
        let mut state = self.store.state();
        let ok = state.keepalive_failures == 0;
        state.keepalive_failures = state.keepalive_failures.saturating_sub(1);
        state.events.push(StoreEvent::KeepAlive {
            session: self.id.clone(),
            ok,
        });
        if ok {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                message: "injected keep-alive outage".to_string(),
            })
        }
    }

    fn stop(mut self) -> Result<(), StoreError> {
        self.release();
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(pairs: &[(&str, &str)]) -> DataTree {
        pairs.iter().copied().collect()
    }

    #[test]
    fn commit_is_visible_to_other_handles() {
        let store = MemoryStore::new();
        let observer = store.clone();
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        sess.edit_batch(&tree(&[("/a/x", "1")])).unwrap();
        assert!(observer.read(DatastoreKind::Operational, "/").is_empty());
        sess.apply_changes().unwrap();
        assert_eq!(
            observer.read(DatastoreKind::Operational, "/a").get("/a/x"),
            Some("1")
        );
        assert_eq!(observer.commit_count(), 1);
        assert!(observer.last_commit_at().is_some());
    }

    #[test]
    fn rejected_commit_discards_the_whole_batch() {
        let store = MemoryStore::new();
        store.inject(Fault::RejectPath("/bad".into()));
        let mut sess = store.start_session(DatastoreKind::Operational).unwrap();
        sess.edit_batch(&tree(&[("/good", "1"), ("/bad/leaf", "2")]))
            .unwrap();
        let err = sess.apply_changes().unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert!(store.read(DatastoreKind::Operational, "/").is_empty());
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn keepalive_outage_recovers() {
        let store = MemoryStore::new();
        store.inject(Fault::KeepAliveOutage(2));
        let sess = store.start_session(DatastoreKind::Operational).unwrap();
        assert!(sess.keepalive().is_err());
        assert!(sess.keepalive().is_err());
        assert!(sess.keepalive().is_ok());
    }

    #[test]
    fn drop_and_stop_release_once() {
        let store = MemoryStore::new();
        let sess = store.start_session(DatastoreKind::Operational).unwrap();
        assert_eq!(store.live_sessions().len(), 1);
        sess.stop().unwrap();
        assert!(store.live_sessions().is_empty());
        let stops = store
            .events()
            .iter()
            .filter(|e| matches!(e, StoreEvent::SessionStopped { .. }))
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn unavailable_refuses_sessions() {
        let store = MemoryStore::new();
        store.inject(Fault::Unavailable);
        assert!(store.start_session(DatastoreKind::Operational).is_err());
    }
}
