//! `opseed show` - dump a datastore as `path = value` lines

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use opseed_store::{DatastoreKind, FileStore};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only leaves under this path
    #[arg(default_value = "/")]
    pub xpath: String,

    /// Datastore to read (running or operational)
    #[arg(short, long, default_value = "operational")]
    pub datastore: DatastoreKind,

    /// Datastore directory
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// List live operational sessions instead of data
    #[arg(long)]
    pub sessions: bool,
}

pub fn run(args: ShowArgs, config: &Config) -> Result<()> {
    let dir = args.store_dir.unwrap_or_else(|| config.store.base_dir.clone());
    let store = FileStore::connect(&dir)
        .with_context(|| format!("Failed to open datastore at {}", dir.display()))?;

    let mut out = std::io::stdout().lock();
    if args.sessions {
        let sessions = store.live_sessions()?;
        if sessions.is_empty() {
            eprintln!("No live sessions.");
        }
        for id in sessions {
            writeln!(out, "{id}")?;
        }
        return Ok(());
    }

    let tree = store.read(args.datastore, &args.xpath)?;
    if tree.is_empty() {
        eprintln!("No data under {} in {}.", args.xpath, args.datastore);
        return Ok(());
    }
    write!(out, "{tree}")?;
    log::debug!("{} leaves", tree.len());
    Ok(())
}
