//! Environment variable handling for configuration.
//!
//! `H5GLANCE_COLORS`, `PAGER` and `H5GLANCE_LOG_MODE` are read here and
//! nowhere else.

use crate::config::schema::{ColorMode, Config};
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LOG_MODE_VAR};
use std::env;

/// Colour toggle variable.
pub const COLORS_VAR: &str = "H5GLANCE_COLORS";

/// Pager command variable.
pub const PAGER_VAR: &str = "PAGER";

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use h5glance::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if `H5GLANCE_LOG_MODE` is set to an unknown level or
    /// `PAGER` has unbalanced quotes.
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(colors) = env::var(COLORS_VAR) {
            config.colors = ColorMode::from_env_value(&colors);
        }

        if let Ok(pager) = env::var(PAGER_VAR) {
            if let Some(command) = Self::parse_pager(&pager)? {
                config.pager = command;
            }
        }

        if let Ok(mode) = env::var(LOG_MODE_VAR) {
            let level = LogLevel::parse(&mode).map_err(|message| Error::Validation {
                field: LOG_MODE_VAR.into(),
                message,
            })?;
            config.log_level = Some(level);
        }

        Ok(())
    }

    /// Build a [`Config`] from defaults plus the environment.
    ///
    /// # Errors
    ///
    /// See [`EnvironmentConfig::apply_overrides`].
    pub fn load() -> Result<Config> {
        let mut config = Config::default();
        Self::apply_overrides(&mut config)?;
        Ok(config)
    }

    /// Split a pager command line the way a POSIX shell would.
    ///
    /// Returns `None` for a blank value so the default pager is kept.
    fn parse_pager(s: &str) -> Result<Option<Vec<String>>> {
        let parts = shlex::split(s).ok_or_else(|| Error::Validation {
            field: PAGER_VAR.into(),
            message: format!("cannot split pager command: {s}"),
        })?;
        Ok(if parts.is_empty() { None } else { Some(parts) })
    }
}
