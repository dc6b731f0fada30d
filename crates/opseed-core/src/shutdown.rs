//! Termination signal handling for graceful shutdown
//!
//! SIGINT and SIGTERM are registered once at process start, before any
//! worker is spawned, so a signal arriving while the worker is still busy
//! is queued rather than killing the process. The controller later blocks
//! in [`TerminationSignals::wait`] to pick it up.

use std::io;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// Which termination request was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGINT (Ctrl-C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl Termination {
    fn from_raw(signal: i32) -> Self {
        if signal == SIGINT {
            Self::Interrupt
        } else {
            Self::Terminate
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Registered SIGINT/SIGTERM listener.
pub struct TerminationSignals {
    signals: Signals,
}

impl TerminationSignals {
    /// Register the handlers. Call once, early in `main`.
    pub fn install() -> io::Result<Self> {
        let signals = Signals::new([SIGINT, SIGTERM])?;
        log::debug!("registered SIGINT/SIGTERM handlers");
        Ok(Self { signals })
    }

    /// Block until a termination signal arrives.
    ///
    /// Returns `None` once the listener has been closed.
    pub fn wait(&mut self) -> Option<Termination> {
        self.signals.forever().next().map(Termination::from_raw)
    }
}
