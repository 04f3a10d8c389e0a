//! Load, align, merge, report and plot.
//!
//! The merge result is an explicit value: when merging fails every later
//! step is skipped and the failure is handed back to the caller.

use crate::domain::{Config, InputPaths};
use crate::grid::{check_compatibility, Dataset};
use crate::io::{open_dataset, write_dataset};
use crate::merge::{merge, MergeError};
use crate::render::{plot, report, write_report, PlotOutcome};
use crate::resample::resample;
use anyhow::{Context, Result};

/// The three datasets as loaded from disk.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub base: Dataset,
    pub concentration: Dataset,
    pub thickness: Dataset,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed { combined: Box<Dataset>, plot: Option<PlotOutcome> },
    MergeFailed { reason: MergeError },
}

pub fn load_inputs(paths: &InputPaths) -> Result<Inputs> {
    let base = open_dataset(&paths.base).context("Failed to load base grid")?;
    let concentration = open_dataset(&paths.concentration).context("Failed to load concentration grid")?;
    let thickness = open_dataset(&paths.thickness).context("Failed to load thickness grid")?;
    Ok(Inputs { base, concentration, thickness })
}

/// Run every stage against datasets already in memory.
pub fn process(inputs: &Inputs, config: &Config) -> Result<RunOutcome> {
    report::print_dimensions("Dataset", &inputs.base);
    report::print_dimensions("Concentration data", &inputs.concentration);
    report::print_dimensions("Thickness data", &inputs.thickness);

    check_compatibility(&inputs.base, &inputs.concentration, &config.grid)
        .context("Concentration grid is incompatible with the base grid")?;
    check_compatibility(&inputs.base, &inputs.thickness, &config.grid)
        .context("Thickness grid is incompatible with the base grid")?;

    let concentration = resample(&inputs.concentration, &inputs.base, &config.grid)
        .context("Failed to resample concentration grid")?;
    let thickness = resample(&inputs.thickness, &inputs.base, &config.grid)
        .context("Failed to resample thickness grid")?;

    report::print_dataset("Concentration data resampled", &concentration);
    report::print_dataset("Thickness data resampled", &thickness);

    let combined = match merge(&[&inputs.base, &concentration, &thickness]) {
        Ok(combined) => combined,
        Err(reason) => {
            println!("Error during merging: {reason}");
            return Ok(RunOutcome::MergeFailed { reason });
        }
    };

    report::print_dataset("Combined dataset", &combined);
    report::print_variables("Variables in combined dataset", &combined);

    if let Some(path) = &config.report {
        let config_value = serde_json::to_value(config)?;
        write_report(path, &combined, &config.inputs, &config_value, config.include_timestamp)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &config.save_combined {
        write_dataset(path, &combined)
            .with_context(|| format!("Failed to save combined dataset {}", path.display()))?;
        println!("Combined dataset written to {}", path.display());
    }

    let missing = plot::report_presence(&combined, &config.plot.checked_variables());
    let plot_outcome = if config.plot.enabled {
        Some(plot(&combined, &config.plot, &missing).context("Failed to plot combined dataset")?)
    } else {
        None
    };

    Ok(RunOutcome::Completed { combined: Box::new(combined), plot: plot_outcome })
}

/// Load the configured inputs and process them.
pub fn run(config: &Config) -> Result<RunOutcome> {
    let inputs = load_inputs(&config.inputs)?;
    process(&inputs, config)
}
