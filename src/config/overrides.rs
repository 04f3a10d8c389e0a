//! Layering of environment variables and CLI flags over a loaded config
//!
//! Precedence: CLI > Env > File > Defaults.

use crate::domain::{Config, InterpolationMethod};
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::path::PathBuf;

/// Prefix for environment overrides, e.g. `SEAICE_MERGE_GRID__METHOD=nearest`.
pub const ENV_PREFIX: &str = "SEAICE_MERGE_";

/// Values supplied on the command line. `None`/`false` leaves the config as is.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base: Option<PathBuf>,
    pub concentration: Option<PathBuf>,
    pub thickness: Option<PathBuf>,
    pub method: Option<InterpolationMethod>,
    pub output: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub save_combined: Option<PathBuf>,
    pub no_plot: bool,
    pub no_timestamp: bool,
    pub allow_hemisphere_mismatch: bool,
}

/// Overlay `SEAICE_MERGE_*` environment variables onto `config`.
///
/// Nested keys use a double underscore: `SEAICE_MERGE_PLOT__WIDTH=800`.
pub fn apply_env(config: Config) -> Result<Config> {
    Figment::from(Serialized::defaults(config))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Invalid SEAICE_MERGE_* environment override")
}

pub fn merge_cli_with_config(mut config: Config, cli: &CliOverrides) -> Config {
    if let Some(path) = &cli.base {
        config.inputs.base = path.clone();
    }
    if let Some(path) = &cli.concentration {
        config.inputs.concentration = path.clone();
    }
    if let Some(path) = &cli.thickness {
        config.inputs.thickness = path.clone();
    }
    if let Some(method) = cli.method {
        config.grid.method = method;
    }
    if let Some(path) = &cli.output {
        config.plot.output = path.clone();
    }
    if let Some(path) = &cli.font {
        config.plot.font = Some(path.clone());
    }
    if let Some(path) = &cli.report {
        config.report = Some(path.clone());
    }
    if let Some(path) = &cli.save_combined {
        config.save_combined = Some(path.clone());
    }
    if cli.no_plot {
        config.plot.enabled = false;
    }
    if cli.no_timestamp {
        config.include_timestamp = false;
    }
    if cli.allow_hemisphere_mismatch {
        config.grid.allow_hemisphere_mismatch = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_replace_config_values() {
        let cli = CliOverrides {
            base: Some(PathBuf::from("south.nc")),
            method: Some(InterpolationMethod::Nearest),
            report: Some(PathBuf::from("out/report.json")),
            no_plot: true,
            ..CliOverrides::default()
        };
        let merged = merge_cli_with_config(Config::default(), &cli);
        assert_eq!(merged.inputs.base, PathBuf::from("south.nc"));
        assert_eq!(merged.inputs.thickness, Config::default().inputs.thickness);
        assert_eq!(merged.grid.method, InterpolationMethod::Nearest);
        assert_eq!(merged.report, Some(PathBuf::from("out/report.json")));
        assert!(!merged.plot.enabled);
        assert!(merged.include_timestamp);
    }

    #[test]
    fn empty_overrides_keep_config() {
        let merged = merge_cli_with_config(Config::default(), &CliOverrides::default());
        assert_eq!(merged, Config::default());
    }

    #[test]
    fn environment_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SEAICE_MERGE_GRID__METHOD", "nearest");
            jail.set_env("SEAICE_MERGE_PLOT__WIDTH", "800");
            let config = apply_env(Config::default()).expect("env");
            assert_eq!(config.grid.method, InterpolationMethod::Nearest);
            assert_eq!(config.plot.width, 800);
            assert_eq!(config.plot.panels, Config::default().plot.panels);
            Ok(())
        });
    }
}
