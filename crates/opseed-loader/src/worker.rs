//! Background worker: load, announce, keep alive, release

use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use opseed_store::{Datastore, DatastoreKind, Session};

use crate::error::LoadError;
use crate::keepalive::{KeepAlive, KeepAliveStats};
use crate::readiness::ReadyNotifier;
use crate::snapshot::SnapshotLoader;
use crate::state::{StateCell, WorkerState};
use crate::stop::StopSignal;

/// What a worker did before it terminated cleanly.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub files: usize,
    pub leaves: usize,
    pub ready_at: DateTime<Utc>,
    pub keepalive: KeepAliveStats,
}

/// Owns the store connection and, while running, the operational session.
pub struct Worker<D> {
    store: D,
    loader: SnapshotLoader,
    keepalive: KeepAlive,
    notifier: ReadyNotifier,
    stop: StopSignal,
    state: StateCell,
}

impl<D: Datastore> Worker<D> {
    pub fn new(
        store: D,
        loader: SnapshotLoader,
        keepalive: KeepAlive,
        notifier: ReadyNotifier,
        stop: StopSignal,
        state: StateCell,
    ) -> Self {
        Self {
            store,
            loader,
            keepalive,
            notifier,
            stop,
            state,
        }
    }

    /// Run all phases on the current thread.
    ///
    /// The session is released on every path out of here: explicitly after
    /// keep-alive, by drop on failure. On failure the notifier is dropped
    /// unnotified, after the session.
    pub fn run(self) -> Result<WorkerSummary, LoadError> {
        let Worker {
            store,
            loader,
            keepalive,
            notifier,
            stop,
            state,
        } = self;

        let mut session = match store.start_session(DatastoreKind::Operational) {
            Ok(session) => session,
            Err(e) => {
                state.transition(WorkerState::Terminated);
                return Err(LoadError::Session(e));
            }
        };
        log::info!(
            "loading {} snapshot files into session {}",
            loader.files().len(),
            session.id()
        );

        let report = match loader.load(&mut session) {
            Ok(report) => report,
            Err(e) => {
                drop(session);
                state.transition(WorkerState::Terminated);
                return Err(e);
            }
        };

        state.transition(WorkerState::ReadyWaiting);
        let ready_at = notifier.notify_ready(&report);
        log::info!(
            "applied {} files ({} leaves) in {:.2}s",
            report.files(),
            report.leaves(),
            report.elapsed().as_secs_f64()
        );

        state.transition(WorkerState::Alive);
        let stats = keepalive.run(&session, &stop);

        state.transition(WorkerState::Stopping);
        if let Err(e) = session.stop() {
            log::warn!("session did not stop cleanly: {e}");
        }
        state.transition(WorkerState::Terminated);

        Ok(WorkerSummary {
            files: report.files(),
            leaves: report.leaves(),
            ready_at,
            keepalive: stats,
        })
    }
}

impl<D: Datastore + Send + 'static> Worker<D> {
    /// Run on a dedicated, named thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Result<WorkerSummary, LoadError>>> {
        std::thread::Builder::new()
            .name("opseed-worker".to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::{ReadyOutcome, readiness};
    use opseed_store::{Fault, MemoryStore};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    const INTERVAL: Duration = Duration::from_millis(50);

    fn write(dir: &Path, name: &str, xml: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, xml).unwrap();
        path
    }

    struct Harness {
        store: MemoryStore,
        stop: StopSignal,
        state: StateCell,
    }

    fn spawn(
        files: Vec<PathBuf>,
        store: MemoryStore,
    ) -> (
        Harness,
        crate::readiness::ReadyWaiter,
        JoinHandle<Result<WorkerSummary, LoadError>>,
    ) {
        let (notifier, waiter) = readiness();
        let stop = StopSignal::new();
        let state = StateCell::new();
        let worker = Worker::new(
            store.clone(),
            SnapshotLoader::new(files),
            KeepAlive::new(INTERVAL, 60),
            notifier,
            stop.clone(),
            state.clone(),
        );
        let handle = worker.spawn().unwrap();
        (Harness { store, stop, state }, waiter, handle)
    }

    #[test]
    fn full_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "a.xml", "<s><v>1</v></s>"),
            write(dir.path(), "b.xml", "<s><v>2</v></s>"),
        ];
        let (h, waiter, handle) = spawn(files, MemoryStore::new());

        let ReadyOutcome::Ready(at) = waiter.wait() else {
            panic!("worker should become ready");
        };
        assert_eq!(h.store.commit_count(), 2);
        assert!(at >= h.store.last_commit_at().unwrap());
        assert_eq!(h.store.live_sessions().len(), 1);

        std::thread::sleep(INTERVAL * 2 + INTERVAL / 2);
        assert_eq!(h.state.get(), WorkerState::Alive);

        h.stop.request_stop();
        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.ready_at, at);
        assert!(summary.keepalive.ticks >= 1);
        assert_eq!(h.state.get(), WorkerState::Terminated);
        assert!(h.store.live_sessions().is_empty());
    }

    #[test]
    fn stop_is_honoured_within_two_intervals() {
        let (h, waiter, handle) = spawn(vec![], MemoryStore::new());
        assert!(matches!(waiter.wait(), ReadyOutcome::Ready(_)));
        std::thread::sleep(INTERVAL + INTERVAL / 2);

        let start = Instant::now();
        h.stop.request_stop();
        handle.join().unwrap().unwrap();
        assert!(start.elapsed() <= INTERVAL * 2);
        assert!(h.store.live_sessions().is_empty());
    }

    #[test]
    fn load_failure_abandons_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "a.xml", "<a>1</a>"),
            write(dir.path(), "b.xml", "<broken>"),
        ];
        let (h, waiter, handle) = spawn(files, MemoryStore::new());

        assert_eq!(waiter.wait(), ReadyOutcome::Abandoned);
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.phase(), "parse");
        assert_eq!(h.state.get(), WorkerState::Terminated);
        assert!(h.store.live_sessions().is_empty());
    }

    #[test]
    fn session_failure_abandons() {
        let store = MemoryStore::new();
        store.inject(Fault::Unavailable);
        let (_h, waiter, handle) = spawn(vec![], store);
        assert_eq!(waiter.wait(), ReadyOutcome::Abandoned);
        assert!(matches!(
            handle.join().unwrap().unwrap_err(),
            LoadError::Session(_)
        ));
    }

    #[test]
    fn readiness_not_visible_before_last_commit() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "a.xml", "<a>1</a>"),
            write(dir.path(), "b.xml", "<b>2</b>"),
        ];
        let store = MemoryStore::new();
        store.inject(Fault::CommitDelay(Duration::from_millis(40)));
        let (h, waiter, handle) = spawn(files, store);

        // still inside the first or second commit
        assert_eq!(waiter.wait_timeout(Duration::from_millis(30)), None);
        assert!(h.store.commit_count() < 2);

        assert!(matches!(waiter.wait(), ReadyOutcome::Ready(_)));
        assert_eq!(h.store.commit_count(), 2);
        h.stop.request_stop();
        handle.join().unwrap().unwrap();
    }
}
