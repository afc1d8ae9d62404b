//! Entry point for h5glance-html.
//!
//! Serves a collapsible HTML view of an HDF5 file to the browser, or
//! writes it to a file with `--write`.

use clap::Parser;
use h5glance_cli::utils::load_config;
use h5glance_cli::HtmlCli;

fn main() {
    let cli = HtmlCli::parse();
    let global = cli.global();

    let result = load_config(&global).and_then(|config| {
        h5glance::init_logger(global.verbose, global.quiet, config.log_level).install();
        cli.command.execute(&global)
    });
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
