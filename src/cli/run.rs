//! Run command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::{apply_env, load_config, merge_cli_with_config, CliOverrides};
use crate::domain::InterpolationMethod;
use crate::pipeline::{self, RunOutcome};

#[derive(Args)]
pub struct RunArgs {
    /// Config file (TOML or YAML). Discovered in the working directory when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base grid whose x/y axes every other grid is resampled onto
    #[arg(long, value_name = "PATH")]
    pub base: Option<PathBuf>,

    /// Sea-ice concentration grid
    #[arg(long, value_name = "PATH")]
    pub concentration: Option<PathBuf>,

    /// Sea-ice thickness grid
    #[arg(long, value_name = "PATH")]
    pub thickness: Option<PathBuf>,

    /// Interpolation method (linear or nearest)
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<InterpolationMethod>,

    /// PNG file the figure is written to
    #[arg(short, long, value_name = "PNG")]
    pub output: Option<PathBuf>,

    /// TrueType font used for titles and labels
    #[arg(long, value_name = "TTF")]
    pub font: Option<PathBuf>,

    /// Write a JSON report of the combined dataset
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,

    /// Write the combined dataset to a NetCDF file
    #[arg(long, value_name = "PATH")]
    pub save_combined: Option<PathBuf>,

    /// Skip the figure
    #[arg(long)]
    pub no_plot: bool,

    /// Omit the generation timestamp from the report
    #[arg(long)]
    pub no_timestamp: bool,

    /// Continue with a warning when grids cover different hemispheres or extents
    #[arg(long)]
    pub allow_hemisphere_mismatch: bool,
}

impl RunArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            base: self.base.clone(),
            concentration: self.concentration.clone(),
            thickness: self.thickness.clone(),
            method: self.method,
            output: self.output.clone(),
            font: self.font.clone(),
            report: self.report.clone(),
            save_combined: self.save_combined.clone(),
            no_plot: self.no_plot,
            no_timestamp: self.no_timestamp,
            allow_hemisphere_mismatch: self.allow_hemisphere_mismatch,
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let config = load_config(&cwd, args.config.as_deref())?;
    let config = apply_env(config)?;
    let config = merge_cli_with_config(config, &args.overrides());

    tracing::debug!(
        "Inputs: base={} concentration={} thickness={}",
        config.inputs.base.display(),
        config.inputs.concentration.display(),
        config.inputs.thickness.display()
    );

    match pipeline::run(&config)? {
        RunOutcome::Completed { combined, .. } => {
            tracing::debug!("Combined dataset has {} data variables", combined.data_vars.len());
            Ok(())
        }
        RunOutcome::MergeFailed { .. } => anyhow::bail!("Merge failed; report and plot skipped"),
    }
}
