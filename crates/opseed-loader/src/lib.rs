//! Opseed Loader - seed the operational datastore and hold it
//!
//! A background worker applies snapshot files to an operational session,
//! announces readiness, then keeps the session alive until the controller
//! asks it to stop (normally on SIGINT/SIGTERM).
//!
//! # Example
//!
//! ```ignore
//! use opseed_core::TerminationSignals;
//! use opseed_loader::{Config, ShutdownController};
//! use opseed_store::FileStore;
//!
//! let mut signals = TerminationSignals::install()?;
//! let store = FileStore::connect(std::path::Path::new("/var/lib/opseed"))?;
//! let report = ShutdownController::new(Config::default()).run(store, &mut signals)?;
//! println!("held {} files for {} keep-alive ticks", report.files, report.keepalive_ticks);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod files;
pub mod keepalive;
pub mod readiness;
pub mod snapshot;
pub mod state;
pub mod stop;
pub mod sync_file;
pub mod worker;

// Re-exports
pub use config::{Config, SnapshotSource};
pub use controller::{ShutdownController, ShutdownReport, TerminationWait};
pub use error::{ControllerError, LoadError};
pub use files::resolve_snapshots;
pub use keepalive::{KeepAlive, KeepAliveStats};
pub use readiness::{ReadyNotifier, ReadyOutcome, ReadyWaiter, readiness};
pub use snapshot::{LoadReport, SnapshotLoader};
pub use state::{StateCell, WorkerState};
pub use stop::StopSignal;
pub use worker::{Worker, WorkerSummary};
