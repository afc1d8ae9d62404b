//! Error types for the h5glance library.
//!
//! Every fallible operation in the crate returns [`Result`], built on a
//! single `thiserror` enum. Rendering code recovers locally from [`Error::Read`]
//! and [`Error::Selection`]; the other variants are surfaced to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with an h5glance error.
///
/// # Examples
///
/// ```
/// use h5glance::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the h5glance library.
#[derive(Debug, Error)]
pub enum Error {
    /// The object handed to a renderer is not something it can display.
    #[error("unsupported input: {description}")]
    UnsupportedInputKind {
        /// What the renderer was given.
        description: String,
    },

    /// No object exists at the given in-file path.
    #[error("no object at {path}")]
    NotFound {
        /// The in-file path that could not be resolved.
        path: String,
    },

    /// Reading an attribute or dataset failed in the storage layer.
    #[error("read failed for {path}: {reason}")]
    Read {
        /// The object or attribute being read.
        path: String,
        /// Why the read failed.
        reason: String,
    },

    /// A slice expression was malformed or does not fit the dataset.
    #[error("{message}")]
    Selection {
        /// Description of the selection problem.
        message: String,
    },

    /// A value failed validation (configuration, container construction).
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A JSON container snapshot could not be parsed.
    #[error("invalid container snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The file is a recognized container but no backend was compiled in.
    #[error("cannot open {}: {backend} support is not enabled in this build", path.display())]
    BackendUnavailable {
        /// The file that was requested.
        path: PathBuf,
        /// The backend that would be needed.
        backend: &'static str,
    },

    /// An error reported by the HDF5 library.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Selection`] from any message.
    pub fn selection(message: impl Into<String>) -> Self {
        Self::Selection {
            message: message.into(),
        }
    }

    /// Build a [`Error::NotFound`] for an in-file path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Check if the error means the object does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::Error;
    ///
    /// let err = Error::not_found("/missing");
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
