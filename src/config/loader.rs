//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SECTION: &str = "seaice-merge";

/// Load the run configuration.
///
/// An explicit `config_path` must exist and parse. Without one, the working
/// directory is searched for a config file; a discovered file that fails to
/// parse is logged and defaults are used instead. Relative paths inside a
/// config file are resolved against the file's directory.
pub fn load_config(work_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(work_dir),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    let mut config = match parsed {
        Ok(cfg) => cfg,
        Err(e) => {
            if config_path_provided {
                return Err(e);
            }
            tracing::warn!("Failed to parse auto-discovered config {}: {:#}", config_file.display(), e);
            return Ok(Config::default());
        }
    };

    if let Some(dir) = config_file.parent() {
        resolve_relative(&mut config, dir);
    }
    tracing::debug!("Loaded config from {}", config_file.display());
    Ok(config)
}

/// Parse TOML config, supporting a nested `[seaice-merge]` table.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested `seaice-merge` mapping.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(work_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        "seaice-merge.toml",
        ".seaice-merge.toml",
        "seaice-merge.yaml",
        "seaice-merge.yml",
    ];

    candidates.iter().map(|candidate| work_dir.join(candidate)).find(|path| path.exists())
}

fn resolve_relative(config: &mut Config, dir: &Path) {
    let resolve = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = dir.join(&*path);
        }
    };
    resolve(&mut config.inputs.base);
    resolve(&mut config.inputs.concentration);
    resolve(&mut config.inputs.thickness);
    resolve(&mut config.plot.output);
    for path in [&mut config.plot.font, &mut config.report, &mut config.save_combined]
        .into_iter()
        .flatten()
    {
        resolve(path);
    }
}
