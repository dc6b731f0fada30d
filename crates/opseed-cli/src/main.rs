//! opseed - operational datastore seeding and read benchmarking
//!
//! `load` applies snapshot files to the operational datastore, announces
//! readiness and keeps the session alive until SIGINT/SIGTERM. `bench` times
//! repeated reads against a datastore backend.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

/// Exit code for configuration and other fatal errors
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "opseed")]
#[command(about = "Seed the operational datastore and benchmark reads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./opseed.toml or ~/.config/opseed/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load snapshot files and keep them live until terminated
    Load(cmd::load::LoadArgs),
    /// Time repeated reads against a backend
    Bench(cmd::bench::BenchArgs),
    /// Print datastore contents
    Show(cmd::show::ShowArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(opseed_core::ProgressContext::new());

    // Logging:
    //   bench on a TTY: warn unless --debug, the progress bar shows activity
    //   otherwise:      info unless --quiet
    let bench_bar = progress.is_tty() && matches!(cli.command, Command::Bench(_));
    let multi = if bench_bar { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (bench_bar && !cli.debug);
    opseed_core::init_logging(quiet, cli.debug, multi);

    match run(cli, &progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli, progress: &opseed_core::SharedProgress) -> Result<ExitCode> {
    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Load(args) => cmd::load::run(args, &config),
        Command::Bench(args) => cmd::bench::run(args, &config, progress).map(|()| ExitCode::SUCCESS),
        Command::Show(args) => cmd::show::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Config => {
            show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn show_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Datastore directory",
        &config.store.base_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Snapshot directory",
        &config.load.path.display().to_string(),
    ]);
    table.add_row(vec!["Snapshot pattern", &config.load.pattern]);
    table.add_row(vec![
        "Sync file",
        &config
            .load
            .sync_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string()),
    ]);
    table.add_row(vec![
        "Keep-alive",
        &format!(
            "{}ms (heartbeat every {})",
            config.load.keepalive_ms, config.load.heartbeat_every
        ),
    ]);
    table.add_row(vec!["Bench requests", &config.bench.n.to_string()]);
    table.add_row(vec!["RESTCONF URL", &config.bench.restconf.url]);
    table.add_row(vec![
        "RESTCONF user",
        &config.bench.restconf.username,
    ]);
    table.add_row(vec![
        "RESTCONF password",
        if config.bench.restconf.password.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "RESTCONF datastore",
        &config.bench.restconf.datastore,
    ]);

    eprintln!("\n{table}");
}
