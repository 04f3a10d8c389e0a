//! seaice-merge command-line entry point

use anyhow::Result;

fn main() -> Result<()> {
    seaice_merge::cli::run()
}
