//! Configuration system for h5glance.
//!
//! Configuration comes from two sources, with the following precedence
//! (highest to lowest):
//!
//! 1. Programmatic overrides (CLI flags applied by the caller)
//! 2. Environment variables (`H5GLANCE_COLORS`, `PAGER`, `H5GLANCE_LOG_MODE`)
//! 3. Built-in defaults
//!
//! Renderers never consult the environment themselves; they receive the
//! resolved [`Config`] values.
//!
//! # Examples
//!
//! ```
//! use h5glance::config::{ColorMode, Config};
//!
//! let config = Config {
//!     colors: ColorMode::Never,
//!     ..Default::default()
//! };
//! assert!(!config.colors.resolve(true));
//! ```

pub mod environment;
pub mod schema;

pub use environment::EnvironmentConfig;
pub use schema::{ColorMode, Config, DEFAULT_PAGER};
