//! # escrow CLI entry point
//!
//! Parses command-line arguments, resolves configuration, and dispatches to
//! the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use escrow_cli::commands::{
    cmd_balance, cmd_deploy, cmd_deposit, cmd_resolve, cmd_status, CliContext, DeployArgs,
    DepositArgs, ResolveArgs, StatusArgs,
};
use escrow_cli::config::EscrowConfig;
use escrow_state::Resolution;

/// Escrow CLI
///
/// Deploys a three-party escrow, funds it from the depositor, and lets the
/// arbiter release it to the beneficiary or refund it to the depositor.
#[derive(Parser, Debug)]
#[command(name = "escrow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./escrow.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State file to operate on; overrides `state_file` from the config.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Construct a new escrow; the caller becomes the depositor.
    Deploy(DeployArgs),

    /// Fund the escrow (depositor only, once).
    Deposit(DepositArgs),

    /// Pay the held value to the beneficiary (arbiter only).
    Release(ResolveArgs),

    /// Return the held value to the depositor (arbiter only).
    Refund(ResolveArgs),

    /// Print the value currently held by the escrow.
    Balance,

    /// Show roles, lifecycle flags, events, and transitions.
    Status(StatusArgs),
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
        .init();

    tracing::debug!("escrow CLI starting");

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = EscrowConfig::resolve(cli.config.as_deref(), &cwd)?;
    let ctx = CliContext::new(config, cli.state.as_deref());

    tracing::debug!(state_file = %ctx.state_file.display(), "resolved state file");

    match cli.command {
        Commands::Deploy(args) => cmd_deploy(&ctx, &args),
        Commands::Deposit(args) => cmd_deposit(&ctx, &args),
        Commands::Release(args) => cmd_resolve(&ctx, &args, Resolution::Release),
        Commands::Refund(args) => cmd_resolve(&ctx, &args, Resolution::Refund),
        Commands::Balance => cmd_balance(&ctx),
        Commands::Status(args) => cmd_status(&ctx, &args),
    }
}
