// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! DTEK CLI - power outage directory and schedules from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List supported regions
//! dtek regions
//!
//! # Locations and streets of Kyiv city
//! dtek locations
//! dtek streets "м. Київ"
//!
//! # Weekly schedules of two groups in Odesa
//! dtek --region oem schedules GPV1.1 GPV2.2
//!
//! # Current outage status of one street, as JSON
//! dtek status "м. Київ" "вул. Хрещатик" --format json --pretty
//!
//! # Capture a snapshot for the read-through store
//! dtek snapshot --save
//! ```

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dtek_core::{DtekError, Region};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{directory, regions, schedules, snapshot, status};

// ============================================================================
// CLI Definition
// ============================================================================

/// DTEK CLI - outage directory and schedules.
#[derive(Parser)]
#[command(name = "dtek")]
#[command(about = "Power outage directory and schedules for DTEK regional grids")]
#[command(long_about = r#"
Reads the public outage pages of the DTEK regional grid operators.

Supported regions:
  • kem   Kyiv city
  • krem  Kyiv oblast
  • oem   Odesa
  • dnem  Dnipro
  • dem   Donetsk

Examples:
  dtek locations                         # Locations of Kyiv city
  dtek streets "м. Київ"                 # Streets of one location
  dtek schedules GPV1.1                  # Weekly schedule of a group
  dtek status "м. Київ" "вул. Хрещатик"  # Outage status of a street
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Region to query.
    #[arg(long, short, default_value = "kem", global = true)]
    pub region: Region,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (defaults to $DTEK_CONFIG or the user config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging, no error text).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List supported regions.
    Regions,

    /// List locations of the region.
    #[command(visible_alias = "l")]
    Locations,

    /// List streets of a location.
    Streets(directory::StreetsArgs),

    /// Show weekly schedules of outage groups.
    #[command(visible_alias = "s")]
    Schedules(schedules::SchedulesArgs),

    /// Show outage status of every building on a street.
    Status(status::StatusArgs),

    /// Print (and optionally store) the parsed directory with its cookies.
    Snapshot(snapshot::SnapshotArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Invalid input (unknown location, street, etc.).
    InvalidInput = 2,
    /// Session rejected upstream.
    Unauthorized = 3,
    /// Upstream content could not be parsed.
    ParseError = 4,
    /// Upstream unavailable or blocking us.
    Unavailable = 5,
}

impl ExitCode {
    /// Maps an error to an exit code through its boundary status code.
    pub fn for_error(error: &anyhow::Error) -> Self {
        let Some(dtek) = error.downcast_ref::<DtekError>() else {
            return Self::Error;
        };
        match dtek.status_code() {
            400 => Self::InvalidInput,
            401 => Self::Unauthorized,
            502 => Self::ParseError,
            503 => Self::Unavailable,
            _ => Self::Error,
        }
    }
}

/// Extra advice printed under an error that may clear up by itself.
fn retry_hint(error: &anyhow::Error) -> Option<&'static str> {
    error
        .downcast_ref::<DtekError>()
        .filter(|e| e.is_transient())
        .map(|_| "The upstream may be temporarily unavailable; try again in a few minutes.")
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("dtek=debug,info")
    } else {
        EnvFilter::new("dtek=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = run(&cli).await;

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
            if let Some(hint) = retry_hint(&e) {
                eprintln!("{hint}");
            }
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    if let Commands::Regions = cli.command {
        return regions::run(cli);
    }

    let ctx = context::Context::build(cli)?;
    match &cli.command {
        Commands::Regions => regions::run(cli),
        Commands::Locations => directory::run_locations(&ctx, cli).await,
        Commands::Streets(args) => directory::run_streets(args, &ctx, cli).await,
        Commands::Schedules(args) => schedules::run(args, &ctx, cli).await,
        Commands::Status(args) => status::run(args, &ctx, cli).await,
        Commands::Snapshot(args) => snapshot::run(args, &ctx, cli).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
