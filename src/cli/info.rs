//! Info command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::grid::detect_hemisphere;
use crate::io::open_dataset;
use crate::render::report;

#[derive(Args)]
pub struct InfoArgs {
    /// NetCDF files to describe
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    for (i, path) in args.files.iter().enumerate() {
        let dataset =
            open_dataset(path).with_context(|| format!("Failed to load {}", path.display()))?;

        if i > 0 {
            println!();
        }
        println!("File: {}", path.display());
        println!("Hemisphere: {}", detect_hemisphere(&dataset));
        report::print_dimensions("Dataset", &dataset);
        println!("Variables:");
        print!("{}", report::format_variables(&dataset));
    }
    Ok(())
}
