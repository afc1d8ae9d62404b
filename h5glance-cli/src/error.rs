//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use h5glance::Error as LibError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// The input path does not name a regular file.
    NotAFile(PathBuf),

    /// The input file is in no format we can open.
    NotRecognized(PathBuf),

    /// Invalid command-line arguments or interactive input.
    InvalidArguments(String),

    /// Library error (wrapped).
    Library(LibError),

    /// I/O error.
    Io(io::Error),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Anything that went wrong after the input was accepted
    /// - 2: The input is not a file, or not a recognised container
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotAFile(_) | CliError::NotRecognized(_) => 2,
            CliError::InvalidArguments(_) | CliError::Library(_) | CliError::Io(_) => 1,
        }
    }

    /// Whether the error is stdout having been closed under us, as with
    /// `h5glance big.h5 | head`.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            CliError::Io(e) | CliError::Library(LibError::Io(e)) => {
                e.kind() == io::ErrorKind::BrokenPipe
            }
            _ => false,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotAFile(path) => write!(f, "Not a file: {}", path.display()),
            CliError::NotRecognized(path) => write!(f, "Not an HDF5 file: {}", path.display()),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Library(e) => write!(f, "{e}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        CliError::Library(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
