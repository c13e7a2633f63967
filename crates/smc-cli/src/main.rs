//! # smc CLI entry point
//!
//! Parses command-line arguments and dispatches to the escrow subcommand
//! handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smc_cli::commands::{run_command, Command, RunContext};

/// Staking migration escrow CLI.
///
/// Deploys and operates a local simulated escrow: mint and stake tokens,
/// migrate stake into the escrow, and recover it once the cooldown has
/// elapsed.
#[derive(Parser, Debug)]
#[command(name = "smc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the deployment state.
    #[arg(long, global = true, env = "SMC_STATE_DIR", default_value = ".smc")]
    state_dir: PathBuf,

    /// Pin the clock to this unix timestamp instead of the system time.
    #[arg(long, global = true)]
    now: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(state_dir = %cli.state_dir.display(), "smc starting");

    let result =
        RunContext::at(cli.state_dir, cli.now).and_then(|ctx| run_command(&cli.command, &ctx));

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
