#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # h5glance
//!
//! A library for glancing at the structure of HDF5-style container files.
//!
//! The library walks a container's groups, datasets, attributes and links and
//! renders a compact summary: a box-drawing tree for the terminal, or a
//! collapsible HTML tree for a browser. Objects reachable through several
//! hard links are expanded once and shown as aliases afterwards; soft and
//! external links are shown with their targets and never followed.
//!
//! ## Core Types
//!
//! - [`Container`]: read access to an opened file, with [`MemoryContainer`]
//!   as the built-in backend and a libhdf5 backend behind the `hdf5` feature
//! - [`TreeWalker`] and [`TreeNode`]: cycle-safe traversal into a display tree
//! - [`TextTreeRenderer`] and [`HtmlTreeRenderer`]: the two output forms
//! - [`Datatype`], [`fmt_dtype`], [`fmt_shape`], [`fmt_attr`]: one-line summaries
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use h5glance::{Datatype, MemoryContainer, TextTreeRenderer, TreeWalker, VisitedSet, WalkOptions};
//!
//! let mut file = MemoryContainer::new("sample.h5");
//! file.create_dataset("/group1/subgroup1/dataset1", Datatype::uint(64), &[200]).unwrap();
//! file.create_dataset("/group1/subgroup2/dataset1", Datatype::int(16), &[12]).unwrap();
//! file.link_hard("/synonyms/folder", "/group1/subgroup1").unwrap();
//!
//! let walker = TreeWalker::new(&file, WalkOptions::default());
//! let tree = walker.walk("/", "sample.h5", None, &mut VisitedSet::new()).unwrap();
//! let text = TextTreeRenderer::plain().render_to_string(&tree);
//!
//! assert_eq!(
//!     text,
//!     "sample.h5\n\
//!      ├group1\n\
//!      │ ├subgroup1\n\
//!      │ │ └dataset1\t[uint64: 200]\n\
//!      │ └subgroup2\n\
//!      │   └dataset1\t[int16: 12]\n\
//!      └synonyms\n\
//!      \x20 └folder\t= /group1/subgroup1\n"
//! );
//! ```

pub mod completer;
pub mod config;
pub mod container;
pub mod datatype;
pub mod error;
pub mod format;
pub mod html;
pub mod logging;
pub mod output;
pub mod tree;

// Re-export key types at crate root for convenience
pub use completer::PathCompleter;
pub use config::{ColorMode, Config, EnvironmentConfig};
pub use container::{
    open, Array, Container, LinkKind, MemoryContainer, ObjectId, ObjectKind, ObjectMeta, Scalar,
    Selection, SliceExpr, Value,
};
pub use datatype::{dtype_description, fmt_dtype, Datatype};
pub use error::{Error, Result};
pub use format::{fmt_attr, fmt_shape};
pub use html::HtmlTreeRenderer;
pub use logging::{init_logger, LogLevel, Logger};
pub use output::{display_object, group_to_string, print_dataset_info, MaybePagedOutput, TextTreeRenderer};
pub use tree::{ChildOrder, NodeKind, TreeNode, TreeWalker, VisitedSet, WalkOptions};
