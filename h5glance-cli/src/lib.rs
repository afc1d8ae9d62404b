//! Library exports for h5glance-cli.
//!
//! Both binaries, `h5glance` and `h5glance-html`, are thin wrappers over
//! the modules exported here.

pub mod cli;
pub mod commands;
pub mod error;
pub mod serve;
pub mod utils;

pub use cli::{Cli, HtmlCli};
pub use error::CliError;
