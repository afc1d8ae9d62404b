//! The container abstraction every renderer reads from.
//!
//! A [`Container`] exposes an already-opened hierarchical file through a
//! narrow, path-addressed interface: list a group, classify a link, fetch an
//! object's identity and metadata, read attributes and dataset slices.
//! Renderers never see the storage library behind it.
//!
//! Two backends are provided:
//!
//! - [`MemoryContainer`], an in-memory tree that can be built in code or
//!   loaded from a JSON snapshot.
//! - `Hdf5Container`, backed by libhdf5, when the `hdf5` feature is enabled.
//!
//! [`open`] picks the right backend by sniffing the file contents.

pub mod memory;
pub mod selection;
pub mod value;

#[cfg(feature = "hdf5")]
pub mod libhdf5;

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::datatype::Datatype;
use crate::error::{Error, Result};

pub use memory::MemoryContainer;
pub use selection::{ResolvedSelection, Selection, SliceExpr};
pub use value::{Array, Scalar, Value};

/// The 8-byte HDF5 file signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Stable identity of a storage object.
///
/// Two paths that are hard links to the same object share an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// What kind of object lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A group, which has children.
    Group,
    /// A dataset, which has a datatype and a shape.
    Dataset,
    /// Something else, such as a committed datatype.
    Unknown,
}

/// How a name inside a group refers to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "link", rename_all = "snake_case")]
pub enum LinkKind {
    /// A hard link; the target is a real object in this file.
    Hard,
    /// A symbolic link to a path in this file.
    Soft {
        /// The target path, which may not exist.
        target: String,
    },
    /// A symbolic link to a path in another file.
    External {
        /// The other file's name.
        file: String,
        /// The path inside that file.
        path: String,
    },
}

/// Storage layout of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Stored in the object header.
    Compact,
    /// One contiguous block.
    #[default]
    Contiguous,
    /// Split into chunks.
    Chunked,
    /// Mapped from other datasets.
    Virtual,
    /// A layout this crate does not recognise.
    Unknown,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compact => "Compact",
            Self::Contiguous => "Contiguous",
            Self::Chunked => "Chunked",
            Self::Virtual => "Virtual",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Compression filter applied to a chunked dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compression {
    /// Filter name, e.g. `gzip`.
    pub name: String,
    /// Filter options rendered as text, e.g. `4`.
    #[serde(default)]
    pub options: Option<String>,
}

/// Metadata for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    /// Object kind.
    pub kind: ObjectKind,
    /// Datatype, for datasets.
    pub dtype: Option<Datatype>,
    /// Shape, for datasets. `None` is an empty dataspace, `Some([])` a scalar.
    pub shape: Option<Vec<u64>>,
    /// Maximum shape; [`UNLIMITED`] marks unbounded dimensions.
    pub maxshape: Option<Vec<u64>>,
    /// Storage layout, for datasets.
    pub layout: Option<Layout>,
    /// Chunk shape, for chunked datasets.
    pub chunks: Option<Vec<u64>>,
    /// Compression filter, for chunked datasets.
    pub compression: Option<Compression>,
    /// Number of attributes attached to the object.
    pub num_attrs: usize,
}

impl ObjectMeta {
    /// Metadata for a group with `num_attrs` attributes.
    #[must_use]
    pub const fn group(num_attrs: usize) -> Self {
        Self {
            kind: ObjectKind::Group,
            dtype: None,
            shape: None,
            maxshape: None,
            layout: None,
            chunks: None,
            compression: None,
            num_attrs,
        }
    }

    /// Whether the object is a virtual dataset.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.layout == Some(Layout::Virtual)
    }

    /// Total number of elements; zero for empty dataspaces and groups.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.shape
            .as_deref()
            .map_or(0, |dims| element_count(dims).unwrap_or(u64::MAX))
    }
}

/// Dimension size that marks an unlimited dimension.
pub const UNLIMITED: u64 = u64::MAX;

/// Type and shape of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// Attribute datatype.
    pub dtype: Datatype,
    /// Attribute shape, with the same conventions as [`ObjectMeta::shape`].
    pub shape: Option<Vec<u64>>,
}

/// Read access to an opened hierarchical container.
///
/// Objects are addressed by absolute in-file paths such as `/` or
/// `/group1/subgroup1`. Paths handed to [`Container::link_kind`] name the
/// parent group and the child separately so links can be classified without
/// following them.
pub trait Container {
    /// Name of the file the container was opened from.
    fn filename(&self) -> &str;

    /// Whether an object can be reached at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Names of the members of a group, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `group` does not resolve to a group.
    fn list_children(&self, group: &str) -> Result<Vec<String>>;

    /// Classify the link named `name` inside `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such member.
    fn link_kind(&self, group: &str, name: &str) -> Result<LinkKind>;

    /// Identity of the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is at `path`.
    fn identity(&self, path: &str) -> Result<ObjectId>;

    /// Metadata of the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is at `path`.
    fn metadata(&self, path: &str) -> Result<ObjectMeta>;

    /// Attribute names of the object at `path`, in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is at `path`.
    fn attribute_names(&self, path: &str) -> Result<Vec<String>>;

    /// Datatype and shape of one attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown object or attribute.
    fn attribute_info(&self, path: &str, name: &str) -> Result<AttributeInfo>;

    /// Read an attribute's value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] when the value cannot be decoded.
    fn read_attribute(&self, path: &str, name: &str) -> Result<Value>;

    /// Read part of a dataset.
    ///
    /// The returned array has one dimension per dataset dimension; callers
    /// that dropped indexed dimensions reshape it themselves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] when the selection does not fit the
    /// dataset and [`Error::Read`] when the data cannot be decoded.
    fn read_slice(&self, path: &str, selection: &Selection) -> Result<Array>;
}

/// Join a group path and a member name.
///
/// # Examples
///
/// ```
/// use h5glance::container::join_path;
///
/// assert_eq!(join_path("/", "group1"), "/group1");
/// assert_eq!(join_path("/group1", "dataset2"), "/group1/dataset2");
/// ```
#[must_use]
pub fn join_path(group: &str, name: &str) -> String {
    if group.ends_with('/') {
        format!("{group}{name}")
    } else {
        format!("{group}/{name}")
    }
}

/// Number of elements in a dataspace of `dims`, or `None` if that does not
/// fit in a `u64`.
///
/// # Examples
///
/// ```
/// use h5glance::container::element_count;
///
/// assert_eq!(element_count(&[3, 4]), Some(12));
/// assert_eq!(element_count(&[]), Some(1));
/// assert_eq!(element_count(&[1 << 33, 1 << 33]), None);
/// ```
#[must_use]
pub fn element_count(dims: &[u64]) -> Option<u64> {
    dims.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
}

/// Normalise a user-supplied in-file path to an absolute path.
///
/// Empty components are dropped, so `group1//a/` becomes `/group1/a`.
///
/// # Examples
///
/// ```
/// use h5glance::container::normalize_path;
///
/// assert_eq!(normalize_path("group1/subgroup1/"), "/group1/subgroup1");
/// assert_eq!(normalize_path(""), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

/// The on-disk formats [`open`] understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// An HDF5 file, recognised by its signature.
    Hdf5,
    /// A JSON snapshot readable by [`MemoryContainer`].
    Snapshot,
}

/// Work out which format a file is in, if any.
///
/// The HDF5 signature may sit at offset 0 or at any power of two from 512
/// onwards (after a user block). A file whose first non-blank byte is `{` is
/// treated as a snapshot.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub fn detect_format(path: &Path) -> Result<Option<ContainerFormat>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut offset = 0u64;
    let mut magic = [0u8; 8];
    while offset + 8 <= len {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut magic)?;
        if magic == HDF5_SIGNATURE {
            return Ok(Some(ContainerFormat::Hdf5));
        }
        offset = if offset == 0 { 512 } else { offset * 2 };
    }

    file.seek(SeekFrom::Start(0))?;
    let mut head = [0u8; 64];
    let n = file.read(&mut head)?;
    let first = head[..n].iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        return Ok(Some(ContainerFormat::Snapshot));
    }
    Ok(None)
}

/// Open a container file with whichever backend understands it.
///
/// # Errors
///
/// - [`Error::UnsupportedInputKind`] if the file is in no known format
/// - [`Error::BackendUnavailable`] for HDF5 files when the `hdf5` feature is
///   off
/// - [`Error::Snapshot`] for malformed snapshots
/// - [`Error::Io`] if the file cannot be read
pub fn open(path: &Path) -> Result<Box<dyn Container>> {
    match detect_format(path)? {
        Some(ContainerFormat::Snapshot) => {
            log::debug!("opening {} as a JSON snapshot", path.display());
            Ok(Box::new(MemoryContainer::from_json_file(path)?))
        }
        Some(ContainerFormat::Hdf5) => open_hdf5(path),
        None => Err(Error::UnsupportedInputKind {
            description: format!("{} is not a recognised container file", path.display()),
        }),
    }
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path) -> Result<Box<dyn Container>> {
    log::debug!("opening {} with libhdf5", path.display());
    Ok(Box::new(libhdf5::Hdf5Container::open(path)?))
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path) -> Result<Box<dyn Container>> {
    Err(Error::BackendUnavailable {
        path: path.to_path_buf(),
        backend: "HDF5",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_join_and_normalize() {
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("//a//b"), "/a/b");
    }

    #[test]
    fn test_size_saturates_on_huge_shapes() {
        let mut meta = ObjectMeta::group(0);
        assert_eq!(meta.size(), 0);
        meta.shape = Some(vec![4, 5]);
        assert_eq!(meta.size(), 20);
        meta.shape = Some(vec![1 << 33, 1 << 33]);
        assert_eq!(meta.size(), u64::MAX);
        meta.shape = Some(vec![0, u64::MAX, u64::MAX]);
        assert_eq!(meta.size(), 0);
    }

    #[test]
    fn test_detect_signature_at_start() {
        let mut bytes = HDF5_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 100]);
        let file = temp_with(&bytes);
        assert_eq!(
            detect_format(file.path()).unwrap(),
            Some(ContainerFormat::Hdf5)
        );
    }

    #[test]
    fn test_detect_signature_after_user_block() {
        let mut bytes = vec![0u8; 1024];
        bytes[512..520].copy_from_slice(&HDF5_SIGNATURE);
        let file = temp_with(&bytes);
        assert_eq!(
            detect_format(file.path()).unwrap(),
            Some(ContainerFormat::Hdf5)
        );
    }

    #[test]
    fn test_detect_snapshot() {
        let file = temp_with(b"  \n{\"root\": {}}");
        assert_eq!(
            detect_format(file.path()).unwrap(),
            Some(ContainerFormat::Snapshot)
        );
    }

    #[test]
    fn test_detect_unknown() {
        let file = temp_with(b"just some text");
        assert_eq!(detect_format(file.path()).unwrap(), None);
        assert!(matches!(
            open(file.path()),
            Err(Error::UnsupportedInputKind { .. })
        ));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_open_hdf5_without_backend() {
        let file = temp_with(&HDF5_SIGNATURE);
        assert!(matches!(
            open(file.path()),
            Err(Error::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn test_layout_display() {
        assert_eq!(Layout::Chunked.to_string(), "Chunked");
        assert_eq!(Layout::Unknown.to_string(), "Unknown");
    }
}
