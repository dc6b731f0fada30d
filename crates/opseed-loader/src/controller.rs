//! Main control flow: spawn, await readiness, publish, await signal, join

use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use opseed_core::{Termination, TerminationSignals};
use opseed_store::Datastore;

use crate::config::Config;
use crate::error::{ControllerError, LoadError};
use crate::files::resolve_snapshots;
use crate::keepalive::KeepAlive;
use crate::readiness::{ReadyOutcome, readiness};
use crate::snapshot::SnapshotLoader;
use crate::state::StateCell;
use crate::stop::StopSignal;
use crate::sync_file::write_sync_file;
use crate::worker::{Worker, WorkerSummary};

/// Something the controller can block on until it's time to shut down.
pub trait TerminationWait {
    /// `None` means the source closed without a signal; treated as a request
    /// to stop.
    fn wait_for_termination(&mut self) -> Option<Termination>;
}

impl TerminationWait for TerminationSignals {
    fn wait_for_termination(&mut self) -> Option<Termination> {
        self.wait()
    }
}

impl TerminationWait for Receiver<Termination> {
    fn wait_for_termination(&mut self) -> Option<Termination> {
        self.recv().ok()
    }
}

/// Outcome of a clean run.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub files: usize,
    pub leaves: usize,
    pub ready_at: DateTime<Utc>,
    pub signal: Option<Termination>,
    pub keepalive_ticks: u64,
    pub keepalive_failures: u64,
}

/// Drives one loader run from spawn to join.
pub struct ShutdownController {
    config: Config,
    state: StateCell,
}

impl ShutdownController {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: StateCell::new(),
        }
    }

    /// Handle on the worker's lifecycle state, for observers.
    pub fn state(&self) -> StateCell {
        self.state.clone()
    }

    /// Run to completion.
    ///
    /// Returns only after the worker thread has been joined, whatever the
    /// outcome. The worker is never killed: after readiness it is asked to
    /// stop and waited for.
    pub fn run<D, T>(self, store: D, termination: &mut T) -> Result<ShutdownReport, ControllerError>
    where
        D: Datastore + Send + 'static,
        T: TerminationWait + ?Sized,
    {
        let files = resolve_snapshots(&self.config.source)?;

        let (notifier, waiter) = readiness();
        let stop = StopSignal::new();
        let worker = Worker::new(
            store,
            SnapshotLoader::new(files),
            KeepAlive::new(self.config.keepalive_interval, self.config.heartbeat_every),
            notifier,
            stop.clone(),
            self.state.clone(),
        );
        let handle = worker.spawn().map_err(ControllerError::Spawn)?;

        let ready_at = match waiter.wait() {
            ReadyOutcome::Ready(at) => at,
            ReadyOutcome::Abandoned => {
                // worker is on its way out with the load error
                return Err(join_worker(handle)
                    .err()
                    .unwrap_or(ControllerError::WorkerPanicked));
            }
        };
        log::info!("done merging operational data");

        if let Some(path) = &self.config.sync_file {
            if let Err(e) = write_sync_file(path, ready_at) {
                stop.request_stop();
                if let Err(join_err) = join_worker(handle) {
                    log::error!("worker: {join_err}");
                }
                return Err(ControllerError::SyncFile {
                    path: path.clone(),
                    source: e,
                });
            }
            log::info!("wrote sync file {}", path.display());
        }

        let signal = termination.wait_for_termination();
        match signal {
            Some(signal) => log::info!("received {signal}, stopping"),
            None => log::info!("termination source closed, stopping"),
        }
        stop.request_stop();

        let summary = join_worker(handle)?;
        log::info!(
            "worker stopped after {} keep-alive ticks",
            summary.keepalive.ticks
        );
        Ok(ShutdownReport {
            files: summary.files,
            leaves: summary.leaves,
            ready_at: summary.ready_at,
            signal,
            keepalive_ticks: summary.keepalive.ticks,
            keepalive_failures: summary.keepalive.failures,
        })
    }
}

fn join_worker(
    handle: JoinHandle<Result<WorkerSummary, LoadError>>,
) -> Result<WorkerSummary, ControllerError> {
    match handle.join() {
        Ok(result) => result.map_err(ControllerError::Load),
        Err(_) => Err(ControllerError::WorkerPanicked),
    }
}
