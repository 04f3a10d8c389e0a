//! `seaice-merge` command line
//!
//! `run` executes the load/resample/merge/plot pipeline; `info` describes
//! NetCDF files without processing them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod info;
mod run;

/// Align sea-ice grids onto a common base grid, merge them, and plot them
#[derive(Parser)]
#[command(name = "seaice-merge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, resample, merge, report and plot the three input grids
    Run(Box<run::RunArgs>),

    /// Print dimensions and variables of NetCDF files
    Info(info::InfoArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run::run(*args),
        Commands::Info(args) => info::run(args),
    }
}

/// Level applied on top of `RUST_LOG` directives.
fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Log events go to stderr so that stdout carries only the dataset summaries.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::from_default_env().add_directive(log_level(verbose).into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
