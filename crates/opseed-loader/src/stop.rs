//! Cooperative stop request with an interruptible wait

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    stopped: Mutex<bool>,
    cond: Condvar,
}

/// Stop flag shared between the controller and the worker.
///
/// Set once, never cleared. The worker sleeps in
/// [`wait_timeout`](StopSignal::wait_timeout), which returns as soon as the
/// flag is set instead of finishing the interval.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the worker to stop. Idempotent.
    pub fn request_stop(&self) {
        let mut stopped = self.lock();
        if !*stopped {
            *stopped = true;
            self.inner.cond.notify_all();
        }
    }

    /// Sleep up to `interval`; `true` if a stop was requested.
    pub fn wait_timeout(&self, interval: Duration) -> bool {
        let stopped = self.lock();
        let (stopped, _) = self
            .inner
            .cond
            .wait_timeout_while(stopped, interval, |s| !*s)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}
