//! `opseed load` - seed the operational datastore and hold it until signalled

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};

use opseed_core::{TerminationSignals, fmt_num};
use opseed_loader::{ShutdownController, SnapshotSource};
use opseed_store::FileStore;

use crate::config::Config;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").args(["path", "file"])))]
pub struct LoadArgs {
    /// Directory of snapshot files, applied in file name order
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Single snapshot file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Write a UTC timestamp here once every file is applied
    #[arg(short, long)]
    pub sync_file: Option<PathBuf>,

    /// Datastore directory
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Keep-alive interval in milliseconds
    #[arg(long)]
    pub keepalive_ms: Option<u64>,

    /// Log a heartbeat every N keep-alive intervals
    #[arg(long)]
    pub heartbeat_every: Option<u64>,
}

impl LoadArgs {
    /// CLI flags over config file values.
    fn into_loader_config(self, config: &Config) -> opseed_loader::Config {
        let source = match (self.file, self.path) {
            (Some(file), _) => SnapshotSource::File(file),
            (None, path) => SnapshotSource::Directory {
                path: path.unwrap_or_else(|| config.load.path.clone()),
                pattern: config.load.pattern.clone(),
            },
        };
        let keepalive_interval = match self.keepalive_ms {
            Some(ms) => Duration::from_millis(ms.max(1)),
            None => config.load.keepalive_interval(),
        };
        opseed_loader::Config {
            source,
            sync_file: self.sync_file.or_else(|| config.load.sync_file.clone()),
            keepalive_interval,
            heartbeat_every: self
                .heartbeat_every
                .unwrap_or(config.load.heartbeat_every),
        }
    }
}

pub fn run(args: LoadArgs, config: &Config) -> Result<ExitCode> {
    // Registered before the worker exists so early signals are queued
    let mut signals =
        TerminationSignals::install().context("Failed to register signal handlers")?;

    let store_dir = args
        .store_dir
        .clone()
        .unwrap_or_else(|| config.store.base_dir.clone());
    let loader_config = args.into_loader_config(config);

    match &loader_config.source {
        SnapshotSource::Directory { path, pattern } => {
            log::info!("Loading {pattern} from {}", path.display())
        }
        SnapshotSource::File(file) => log::info!("Loading {}", file.display()),
    }
    log::debug!("  Datastore: {}", store_dir.display());

    let store = FileStore::connect(&store_dir)
        .with_context(|| format!("Failed to open datastore at {}", store_dir.display()))?;

    match ShutdownController::new(loader_config).run(store, &mut signals) {
        Ok(report) => {
            log::info!(
                "Shut down cleanly: {} files, {} leaves, ready at {}",
                report.files,
                fmt_num(report.leaves),
                report.ready_at.format("%Y-%m-%d %H:%M:%S%.6f")
            );
            if report.keepalive_failures > 0 {
                log::warn!(
                    "{} of {} keep-alives failed",
                    report.keepalive_failures,
                    report.keepalive_ticks
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::error!("{e}");
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
