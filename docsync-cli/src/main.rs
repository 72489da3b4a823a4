//! docsync — documentation freshness reader CLI.
//!
//! # Usage
//!
//! ```text
//! docsync read <kind:namespace/name> --content-root <dir> [--path <path>]
//!              [--sync-script <file>] [--config <file>] [--timeout-ms <n>] [--json]
//! docsync states
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{read::ReadArgs, states::StatesArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "docsync",
    version,
    about = "Reconcile published documentation with its build status",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read one documentation page and follow it until its state settles.
    Read(ReadArgs),

    /// Print how every reader state resolves to a display state.
    States(StatesArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    match cli.command {
        Commands::Read(args) => args.run(),
        Commands::States(args) => args.run(),
    }
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
