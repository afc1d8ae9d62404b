//! Configuration schema definitions.
//!
//! The configuration is small: colour policy, the pager command and an
//! optional log level. It is resolved once per process and handed to the
//! renderers as plain values.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Default pager used when `PAGER` is unset or empty.
pub const DEFAULT_PAGER: [&str; 2] = ["less", "-r"];

/// Resolved configuration for a render session.
///
/// # Examples
///
/// ```
/// use h5glance::config::{ColorMode, Config};
///
/// let config = Config::default();
/// assert_eq!(config.colors, ColorMode::Auto);
/// assert_eq!(config.pager, vec!["less".to_string(), "-r".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// When to emit ANSI colour codes.
    pub colors: ColorMode,

    /// Pager command line, program first.
    pub pager: Vec<String>,

    /// Log level requested through the environment, if any.
    #[serde(skip)]
    pub log_level: Option<LogLevel>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colors: ColorMode::Auto,
            pager: DEFAULT_PAGER.iter().map(ToString::to_string).collect(),
            log_level: None,
        }
    }
}

/// Colour policy for terminal output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour only when writing to an interactive terminal.
    #[default]
    Auto,
    /// Always colour.
    Always,
    /// Never colour.
    Never,
}

impl ColorMode {
    /// Interprets the `H5GLANCE_COLORS` value.
    ///
    /// Empty means [`ColorMode::Auto`], `"0"` means [`ColorMode::Never`] and
    /// anything else means [`ColorMode::Always`].
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::config::ColorMode;
    ///
    /// assert_eq!(ColorMode::from_env_value(""), ColorMode::Auto);
    /// assert_eq!(ColorMode::from_env_value("0"), ColorMode::Never);
    /// assert_eq!(ColorMode::from_env_value("yes"), ColorMode::Always);
    /// ```
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        match value {
            "" => Self::Auto,
            "0" => Self::Never,
            _ => Self::Always,
        }
    }

    /// Decides whether to colour, given whether stdout is a terminal.
    ///
    /// Colour escapes are only emitted on Unix platforms.
    #[must_use]
    pub fn resolve(self, is_terminal: bool) -> bool {
        if !cfg!(unix) {
            return false;
        }
        match self {
            Self::Auto => is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.colors, ColorMode::Auto);
        assert_eq!(config.pager, vec!["less", "-r"]);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_color_mode_from_env_value() {
        assert_eq!(ColorMode::from_env_value(""), ColorMode::Auto);
        assert_eq!(ColorMode::from_env_value("0"), ColorMode::Never);
        assert_eq!(ColorMode::from_env_value("1"), ColorMode::Always);
        assert_eq!(ColorMode::from_env_value("00"), ColorMode::Always);
    }

    #[cfg(unix)]
    #[test]
    fn test_color_mode_resolve() {
        assert!(ColorMode::Auto.resolve(true));
        assert!(!ColorMode::Auto.resolve(false));
        assert!(ColorMode::Always.resolve(false));
        assert!(!ColorMode::Never.resolve(true));
    }

    #[test]
    fn test_color_mode_serde() {
        let mode: ColorMode = serde_json::from_str("\"never\"").unwrap();
        assert_eq!(mode, ColorMode::Never);
        assert_eq!(serde_json::to_string(&ColorMode::Always).unwrap(), "\"always\"");
    }
}
