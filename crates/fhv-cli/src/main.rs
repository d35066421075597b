//! # fhv CLI entry point
//!
//! Parses arguments, resolves configuration and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fhv_cli::files::{run_hash, run_store, run_verify, HashArgs, StoreArgs, VerifyArgs};
use fhv_cli::records::{
    run_clear, run_history, run_list, run_show, run_stats, ClearArgs, HistoryArgs, ShowArgs,
};
use fhv_cli::{App, AppConfig, EXIT_FAILURE};
use fhv_store::StoreMode;

/// File Hash Verifier
///
/// Records SHA-256 digests of files and checks later copies against them,
/// in a local data directory or on a ledger contract.
#[derive(Parser, Debug)]
#[command(name = "fhv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record store: local or ledger.
    #[arg(long, global = true)]
    mode: Option<StoreMode>,

    /// Directory for local records and the activity log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 digest of a file.
    Hash(HashArgs),

    /// Store a file's digest under a name.
    Store(StoreArgs),

    /// Check whether a file's content was stored before.
    Verify(VerifyArgs),

    /// List all stored records.
    List,

    /// Show one record by name.
    Show(ShowArgs),

    /// Print record and activity statistics.
    Stats,

    /// Print recent store and verify attempts.
    History(HistoryArgs),

    /// Remove all local records.
    Clear(ClearArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_flags(cli.mode, cli.data_dir);
    tracing::debug!(?config, "configuration resolved");
    let app = App::new(config, cli.json);

    match &cli.command {
        Commands::Hash(args) => run_hash(args, &app).await,
        Commands::Store(args) => run_store(args, &app).await,
        Commands::Verify(args) => run_verify(args, &app).await,
        Commands::List => run_list(&app).await,
        Commands::Show(args) => run_show(args, &app).await,
        Commands::Stats => run_stats(&app).await,
        Commands::History(args) => run_history(args, &app).await,
        Commands::Clear(args) => run_clear(args, &app).await,
    }
}
