//! CLI structure and argument definitions.
//!
//! Each binary has its own top-level parser. The arguments specific to a
//! binary live on its command struct and are flattened in here next to the
//! shared flags.

use crate::commands::{HtmlCommand, ViewCommand};
use crate::utils::GlobalOptions;
use clap::Parser;
use h5glance::ColorMode;

/// View HDF5 file structure in the terminal.
#[derive(Parser)]
#[command(name = "h5glance")]
#[command(version, about = "View HDF5 file structure in the terminal", long_about = None)]
pub struct Cli {
    /// When to colour the tree [default: $H5GLANCE_COLORS, else auto]
    #[arg(long, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long)]
    pub quiet: bool,

    #[command(flatten)]
    pub command: ViewCommand,
}

impl Cli {
    /// The options shared with every command.
    pub fn global(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            color: self.color,
        }
    }
}

/// View HDF5 file structure in HTML.
#[derive(Parser)]
#[command(name = "h5glance-html")]
#[command(version, about = "View HDF5 file structure in HTML", long_about = None)]
pub struct HtmlCli {
    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long)]
    pub quiet: bool,

    #[command(flatten)]
    pub command: HtmlCommand,
}

impl HtmlCli {
    /// The options shared with every command.
    pub fn global(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            color: None,
        }
    }
}
