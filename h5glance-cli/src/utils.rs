//! Utility functions for CLI operations.
//!
//! Input validation and configuration loading shared by both binaries.

use crate::error::CliError;
use h5glance::container::detect_format;
use h5glance::{ColorMode, Config, EnvironmentConfig};
use std::path::Path;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Colour policy from `--color`, overriding the environment.
    pub color: Option<ColorMode>,
}

/// Make sure `path` is a regular file in a format we can open.
pub fn check_input(path: &Path) -> Result<(), CliError> {
    if !path.is_file() {
        return Err(CliError::NotAFile(path.to_path_buf()));
    }
    match detect_format(path)? {
        Some(format) => {
            log::debug!("{} detected as {format:?}", path.display());
            Ok(())
        }
        None => Err(CliError::NotRecognized(path.to_path_buf())),
    }
}

/// Load configuration from the environment, then apply CLI flags.
pub fn load_config(global: &GlobalOptions) -> Result<Config, CliError> {
    let mut config = EnvironmentConfig::load()?;
    if let Some(color) = global.color {
        config.colors = color;
    }
    Ok(config)
}
