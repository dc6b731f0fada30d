//! `opseed bench` - time repeated reads against a datastore backend

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use opseed_bench::{BackendKind, RestconfConfig};
use opseed_core::SharedProgress;

use crate::config::Config;

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum Backend {
    /// `get_data` on a local file datastore session
    Store,
    /// HTTP requests to a RESTCONF server
    Restconf,
}

impl From<Backend> for BackendKind {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Store => BackendKind::Store,
            Backend::Restconf => BackendKind::Restconf,
        }
    }
}

#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Backend to time
    #[arg(long, value_enum, default_value = "store")]
    pub backend: Backend,

    /// Path to request
    #[arg(short, long)]
    pub path: String,

    /// Number of requests
    #[arg(short)]
    pub n: Option<usize>,

    /// Log every response
    #[arg(short, long)]
    pub verbose: bool,

    /// Datastore directory (store backend)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// RESTCONF root URL
    #[arg(long)]
    pub url: Option<String>,

    /// Datastore to read over RESTCONF
    #[arg(long)]
    pub datastore: Option<String>,

    /// POST this file's body instead of the GET (restconf backend)
    #[arg(long)]
    pub raw_request: Option<PathBuf>,
}

impl BenchArgs {
    fn into_bench_config(self, config: &Config) -> opseed_bench::Config {
        let section = &config.bench.restconf;
        opseed_bench::Config {
            backend: self.backend.into(),
            path: self.path,
            n: self.n.unwrap_or(config.bench.n),
            verbose: self.verbose,
            store_dir: self
                .store_dir
                .unwrap_or_else(|| config.store.base_dir.clone()),
            restconf: RestconfConfig {
                url: self.url.unwrap_or_else(|| section.url.clone()),
                username: section.username.clone(),
                password: section.password.clone().unwrap_or_default(),
                datastore: self
                    .datastore
                    .unwrap_or_else(|| section.datastore.clone()),
                timeout: Duration::from_secs(section.timeout_secs),
                raw_request: self.raw_request,
            },
        }
    }
}

pub fn run(args: BenchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let bench_config = args.into_bench_config(config);
    log::info!(
        "Benchmarking {} x{} on {}",
        bench_config.path,
        bench_config.n,
        bench_config.backend.label()
    );

    let summary = opseed_bench::run(&bench_config, progress).context("Benchmark failed")?;
    let line = summary.line().context("Cannot summarise samples")?;
    if let (Some(min), Some(max)) = (summary.stats.min(), summary.stats.max()) {
        log::debug!("min={:.0}ns max={:.0}ns", min, max);
    }
    println!("{line}");
    Ok(())
}
