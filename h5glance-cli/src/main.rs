//! Main entry point for the h5glance CLI.
//!
//! Shows the structure of an HDF5 file as a tree in the terminal, or the
//! details of a single dataset within it.

use clap::Parser;
use h5glance_cli::utils::load_config;
use h5glance_cli::Cli;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    let global = cli.global();

    // Resolve the environment once, then initialize logging from it
    let result = load_config(&global).and_then(|config| {
        h5glance::init_logger(global.verbose, global.quiet, config.log_level).install();
        cli.command.execute(&config)
    });

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) if e.is_broken_pipe() => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
