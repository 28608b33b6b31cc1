//! nvdsync: local mirror of the NVD JSON vulnerability feeds.
//!
//! # Usage
//!
//! ```text
//! nvdsync [--work-dir <dir>] [--config <file>] update [--dry-run] [--no-push]
//! nvdsync [--work-dir <dir>] [--config <file>] status [--json]
//! nvdsync [--work-dir <dir>] [--config <file>] push
//! ```

mod commands;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{push::PushArgs, status::StatusArgs, update::UpdateArgs, Workspace};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "nvdsync",
    version,
    about = "Mirror the NVD vulnerability feeds into one JSON file per record",
    long_about = None,
)]
struct Cli {
    /// Directory holding the record tree, checkpoint and git checkout.
    #[arg(long, global = true, default_value = ".")]
    work_dir: PathBuf,

    /// Configuration file (default: `<work-dir>/nvdsync.yaml`, optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch stale partitions, write records, then commit and push.
    Update(UpdateArgs),

    /// Show which partitions are stale without downloading payloads.
    Status(StatusArgs),

    /// Commit and push the current record tree and checkpoint.
    Push(PushArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let workspace = Workspace::load(cli.work_dir, cli.config.as_deref())?;
    match cli.command {
        Commands::Update(args) => args.run(&workspace).await,
        Commands::Status(args) => args.run(&workspace).await,
        Commands::Push(args) => args.run(&workspace).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
