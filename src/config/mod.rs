//! Configuration loading and merging
//!
//! Handles loading from config files, environment variables, and CLI arguments
//! with proper precedence (CLI > Env > File > Defaults).

pub mod loader;
pub mod overrides;

pub use loader::load_config;
pub use overrides::{apply_env, merge_cli_with_config, CliOverrides};
