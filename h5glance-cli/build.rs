//! Build script for h5glance-cli.
//!
//! Generates man pages for both binaries at build time using clap_mangen.
//! The pages are placed in OUT_DIR/man for inclusion in release builds.
//!
//! Note: We build the command structures here rather than importing them
//! from the crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::{Path, PathBuf};

/// The `h5glance` command structure.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
fn build_view_cli() -> Command {
    Command::new("h5glance")
        .version(env!("CARGO_PKG_VERSION"))
        .about("View HDF5 file structure in the terminal")
        .arg(
            Arg::new("file")
                .help("HDF5 file to view")
                .value_name("FILE")
                .required(true),
        )
        .arg(
            Arg::new("path")
                .help("Object to show within the file, or '-' to prompt for a name")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("attrs")
                .long("attrs")
                .help("Show attributes of groups")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("slice")
                .short('s')
                .long("slice")
                .value_name("EXPR")
                .help("Select part of a dataset to examine, e.g. 0,100:110"),
        )
        .args(global_args())
}

/// The `h5glance-html` command structure.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
fn build_html_cli() -> Command {
    Command::new("h5glance-html")
        .version(env!("CARGO_PKG_VERSION"))
        .about("View HDF5 file structure in HTML")
        .long_about(
            "Serve an HTML view of an HDF5 file on localhost and open it in a browser, \
             or write the view to a file",
        )
        .arg(
            Arg::new("input")
                .help("HDF5 file to view")
                .value_name("FILE")
                .required(true),
        )
        .arg(
            Arg::new("write")
                .short('w')
                .long("write")
                .value_name("HTML_FILE")
                .help("Write output to HTML file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .action(ArgAction::SetTrue),
        )
}

fn global_args() -> Vec<Arg> {
    vec![
        Arg::new("color")
            .long("color")
            .value_name("WHEN")
            .help("When to colour the tree")
            .value_parser(["auto", "always", "never"]),
        Arg::new("verbose")
            .long("verbose")
            .help("Enable verbose output")
            .action(ArgAction::SetTrue),
        Arg::new("quiet")
            .long("quiet")
            .help("Suppress non-essential output")
            .action(ArgAction::SetTrue),
    ]
}

fn write_man(dir: &Path, name: &str, cmd: Command) {
    let mut buffer = Vec::new();
    Man::new(cmd).render(&mut buffer).unwrap();
    fs::write(dir.join(format!("{name}.1")), buffer).unwrap();
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    write_man(&man_dir, "h5glance", build_view_cli());
    write_man(&man_dir, "h5glance-html", build_html_cli());

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
