//! One-shot readiness handshake between the worker and the controller
//!
//! `Mutex + Condvar`, so the controller can never miss the wakeup, and
//! everything the worker committed before notifying is visible to the
//! controller once `wait` returns.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::snapshot::LoadReport;

/// What the controller learns from the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Every snapshot was applied; carries the time of the last commit.
    Ready(DateTime<Utc>),
    /// The worker went away without reaching readiness.
    Abandoned,
}

#[derive(Debug)]
enum Readiness {
    Pending,
    Done(ReadyOutcome),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<Readiness>,
    cond: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Readiness> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// First outcome wins; later calls are ignored.
    fn settle(&self, outcome: ReadyOutcome) {
        let mut state = self.lock();
        if matches!(*state, Readiness::Pending) {
            *state = Readiness::Done(outcome);
            self.cond.notify_all();
        }
    }
}

/// Create a connected notifier/waiter pair.
pub fn readiness() -> (ReadyNotifier, ReadyWaiter) {
    let shared = Arc::new(Shared {
        state: Mutex::new(Readiness::Pending),
        cond: Condvar::new(),
    });
    (
        ReadyNotifier {
            shared: shared.clone(),
            notified: false,
        },
        ReadyWaiter { shared },
    )
}

/// Worker side. Dropping it unnotified tells the waiter the load failed.
#[derive(Debug)]
pub struct ReadyNotifier {
    shared: Arc<Shared>,
    notified: bool,
}

impl ReadyNotifier {
    /// Announce readiness. Consumes the notifier: at most once per worker.
    pub fn notify_ready(mut self, report: &LoadReport) -> DateTime<Utc> {
        let at = report.finished_at();
        self.shared.settle(ReadyOutcome::Ready(at));
        self.notified = true;
        at
    }
}

impl Drop for ReadyNotifier {
    fn drop(&mut self) {
        if !self.notified {
            self.shared.settle(ReadyOutcome::Abandoned);
        }
    }
}

/// Controller side.
#[derive(Debug)]
pub struct ReadyWaiter {
    shared: Arc<Shared>,
}

impl ReadyWaiter {
    /// Block until the worker is ready or gone.
    pub fn wait(&self) -> ReadyOutcome {
        let mut state = self.shared.lock();
        loop {
            if let Readiness::Done(outcome) = *state {
                return outcome;
            }
            state = self
                .shared
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ReadyOutcome> {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .cond
            .wait_timeout_while(state, timeout, |s| matches!(s, Readiness::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        match *state {
            Readiness::Done(outcome) => Some(outcome),
            Readiness::Pending => None,
        }
    }
}
