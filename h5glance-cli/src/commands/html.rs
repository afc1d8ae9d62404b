//! Write an HTML view of a file, or serve it to a browser.

use crate::error::CliError;
use crate::serve::{open_browser_later, PreviewServer, BROWSER_DELAY};
use crate::utils::{check_input, GlobalOptions};
use clap::Args;
use h5glance::HtmlTreeRenderer;
use std::fs;
use std::path::PathBuf;

/// Render a file as a collapsible HTML tree.
#[derive(Args)]
pub struct HtmlCommand {
    /// HDF5 file to view
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Write output to HTML file
    #[arg(short, long, value_name = "HTML_FILE")]
    pub write: Option<PathBuf>,
}

impl HtmlCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        check_input(&self.input)?;

        if let Some(target) = &self.write {
            let document = HtmlTreeRenderer::new().render_file(&self.input)?;
            fs::write(target, document)?;
            if !global.quiet {
                eprintln!("Wrote {}", target.display());
            }
            return Ok(());
        }

        let server = PreviewServer::bind(&self.input)?;
        let url = server.url()?;
        println!("Serving on {url}");
        open_browser_later(url, BROWSER_DELAY);
        server.run()
    }
}
