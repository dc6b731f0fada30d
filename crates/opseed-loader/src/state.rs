//! Worker lifecycle state machine
//!
//! ```text
//! Loading ─▶ ReadyWaiting ─▶ Alive ─▶ Stopping ─▶ Terminated
//!    └──────────────────────────────────────────────▲
//!                 (load failure)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Opening the session and applying snapshots.
    Loading,
    /// Everything applied, readiness being announced.
    ReadyWaiting,
    /// Holding the session, keep-alive loop running.
    Alive,
    /// Stop observed, releasing the session.
    Stopping,
    /// Session released, thread about to exit.
    Terminated,
}

impl WorkerState {
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Loading, ReadyWaiting)
                | (Loading, Terminated)
                | (ReadyWaiting, Alive)
                | (Alive, Stopping)
                | (Stopping, Terminated)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::ReadyWaiting => "ready",
            Self::Alive => "alive",
            Self::Stopping => "stopping",
            Self::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current worker state, readable from other threads.
#[derive(Debug, Clone)]
pub struct StateCell {
    inner: Arc<Mutex<WorkerState>>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkerState::Loading)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> WorkerState {
        *self.lock()
    }

    /// Move to `next`; an illegal transition is refused and returns `false`.
    pub fn transition(&self, next: WorkerState) -> bool {
        let mut state = self.lock();
        if !state.can_transition_to(next) {
            log::error!("refusing worker state change {} -> {next}", *state);
            return false;
        }
        log::debug!("worker state {} -> {next}", *state);
        *state = next;
        true
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
