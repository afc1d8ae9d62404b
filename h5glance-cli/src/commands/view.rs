//! Show a file's structure, or one object in it, in the terminal.

use crate::error::CliError;
use crate::utils::check_input;
use clap::Args;
use h5glance::container::normalize_path;
use h5glance::{
    display_object, Config, Container, MaybePagedOutput, PathCompleter, TextTreeRenderer,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// View a file as a tree, or a single group or dataset inside it.
#[derive(Args)]
pub struct ViewCommand {
    /// HDF5 file to view
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Object to show within the file, or '-' to prompt for a name
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Show attributes of groups
    #[arg(long)]
    pub attrs: bool,

    /// Select part of a dataset to examine, e.g. 0,100:110
    #[arg(short, long, value_name = "EXPR")]
    pub slice: Option<String>,
}

impl ViewCommand {
    pub fn execute(self, config: &Config) -> Result<(), CliError> {
        check_input(&self.file)?;
        let container = h5glance::open(&self.file)?;

        let path = match self.path.as_deref() {
            Some("-") => Some(prompt_for_path(
                container.as_ref(),
                &self.file,
                io::stdin().lock(),
                io::stdout(),
            )?),
            other => other.map(ToString::to_string),
        };

        let renderer = TextTreeRenderer::from_config(config);
        let mut out = MaybePagedOutput::new(io::stdout().lock(), config);
        display_object(
            container.as_ref(),
            path.as_deref(),
            self.attrs,
            self.slice.as_deref(),
            &renderer,
            &mut out,
        )?;
        out.finish()?;
        Ok(())
    }
}

/// Ask for an object path until one names an object in `container`.
///
/// After a miss, paths completing what was typed are listed as hints. End
/// of input gives up with [`CliError::InvalidArguments`].
pub fn prompt_for_path<R: BufRead, W: Write>(
    container: &dyn Container,
    filename: &Path,
    mut input: R,
    mut out: W,
) -> Result<String, CliError> {
    let mut completer = PathCompleter::new(container);
    loop {
        write!(out, "Object path: {}/", filename.display())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Err(CliError::InvalidArguments(
                "no object path entered".to_string(),
            ));
        }

        let entered = line.trim();
        if container.exists(&normalize_path(entered)) {
            writeln!(out)?;
            return Ok(entered.to_string());
        }

        writeln!(out, "No object at '{entered}'")?;
        let hints = completer.completions(entered).unwrap_or_default();
        if !hints.is_empty() {
            writeln!(out, "Possible paths: {}", hints.join("  "))?;
        }
    }
}
