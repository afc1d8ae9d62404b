//! In-memory container backend.
//!
//! [`MemoryContainer`] keeps every object in an arena indexed by
//! [`ObjectId`], with groups holding named links into the arena. Hard links
//! are just two names for one arena slot, which is exactly the aliasing the
//! tree walker has to cope with. Containers are built through the methods
//! below or loaded from a JSON snapshot:
//!
//! ```json
//! {
//!   "filename": "sample.h5",
//!   "root": {
//!     "attrs": {"title": "demo"},
//!     "children": {
//!       "temperature": {"type": "dataset", "dtype": "<f4", "shape": [3, 4]},
//!       "raw": {"type": "group", "children": {}},
//!       "same": {"type": "hardlink", "target": "/raw"},
//!       "latest": {"type": "softlink", "target": "/raw"},
//!       "remote": {"type": "external", "file": "other.h5", "path": "/data"}
//!     }
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::container::selection::Selection;
use crate::container::value::{Array, Scalar, Value};
use crate::container::{
    join_path, normalize_path, AttributeInfo, Compression, Container, Layout, LinkKind, ObjectId,
    ObjectKind, ObjectMeta, UNLIMITED,
};
use crate::datatype::{fmt_dtype, CharacterSet, Datatype, StringSize};
use crate::error::{Error, Result};

const ROOT: usize = 0;

/// Soft links are followed at most this many times while resolving a path.
const MAX_LINK_HOPS: usize = 32;

/// Largest zero-filled selection read from a dataset with no data written.
const MAX_FILL_ELEMENTS: u64 = 1 << 24;

#[derive(Debug, Clone)]
enum Link {
    Hard(usize),
    Soft(String),
    External { file: String, path: String },
}

#[derive(Debug, Clone)]
struct StoredAttr {
    name: String,
    dtype: Datatype,
    shape: Option<Vec<u64>>,
    value: Option<Value>,
}

#[derive(Debug, Clone)]
struct DatasetNode {
    dtype: Datatype,
    shape: Option<Vec<u64>>,
    maxshape: Option<Vec<u64>>,
    layout: Layout,
    chunks: Option<Vec<u64>>,
    compression: Option<Compression>,
    data: Option<Array>,
}

#[derive(Debug, Clone)]
enum NodeBody {
    Group(Vec<(String, Link)>),
    Dataset(Box<DatasetNode>),
    Other,
}

#[derive(Debug, Clone)]
struct Node {
    body: NodeBody,
    attrs: Vec<StoredAttr>,
}

impl Node {
    const fn new(body: NodeBody) -> Self {
        Self {
            body,
            attrs: Vec::new(),
        }
    }
}

/// An arena-backed container held entirely in memory.
///
/// # Examples
///
/// ```
/// use h5glance::{Container, Datatype, MemoryContainer};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/group1/data", Datatype::float(32), &[3, 4]).unwrap();
/// file.link_hard("/alias", "/group1").unwrap();
///
/// assert_eq!(file.list_children("/").unwrap(), vec!["group1", "alias"]);
/// assert_eq!(
///     file.identity("/alias").unwrap(),
///     file.identity("/group1").unwrap()
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    filename: String,
    nodes: Vec<Node>,
}

impl MemoryContainer {
    /// An empty container with just a root group.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            nodes: vec![Node::new(NodeBody::Group(Vec::new()))],
        }
    }

    fn resolve(&self, path: &str) -> Result<usize> {
        self.resolve_hops(path, 0)
    }

    fn resolve_hops(&self, path: &str, hops: usize) -> Result<usize> {
        if hops > MAX_LINK_HOPS {
            return Err(Error::not_found(path));
        }
        let mut current = ROOT;
        let mut parent_path = String::from("/");
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let NodeBody::Group(links) = &self.nodes[current].body else {
                return Err(Error::not_found(path));
            };
            let (_, link) = links
                .iter()
                .find(|(name, _)| name == part)
                .ok_or_else(|| Error::not_found(path))?;
            current = match link {
                Link::Hard(id) => *id,
                Link::Soft(target) => {
                    let absolute = if target.starts_with('/') {
                        target.clone()
                    } else {
                        join_path(&parent_path, target)
                    };
                    self.resolve_hops(&absolute, hops + 1)
                        .map_err(|_| Error::not_found(path))?
                }
                Link::External { .. } => return Err(Error::not_found(path)),
            };
            parent_path = join_path(&parent_path, part);
        }
        Ok(current)
    }

    fn group_links(&self, path: &str) -> Result<&[(String, Link)]> {
        match &self.nodes[self.resolve(path)?].body {
            NodeBody::Group(links) => Ok(links),
            _ => Err(Error::not_found(path)),
        }
    }

    fn dataset(&self, path: &str) -> Result<&DatasetNode> {
        match &self.nodes[self.resolve(path)?].body {
            NodeBody::Dataset(ds) => Ok(ds),
            _ => Err(Error::not_found(path)),
        }
    }

    fn dataset_mut(&mut self, path: &str) -> Result<&mut DatasetNode> {
        let id = self.resolve(path)?;
        match &mut self.nodes[id].body {
            NodeBody::Dataset(ds) => Ok(ds),
            _ => Err(Error::not_found(path)),
        }
    }

    fn stored_attr(&self, path: &str, name: &str) -> Result<&StoredAttr> {
        self.nodes[self.resolve(path)?]
            .attrs
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::not_found(format!("{path}@{name}")))
    }

    /// Resolve `path` to a group, creating it and any missing parents.
    fn ensure_group(&mut self, path: &str) -> Result<usize> {
        let mut current = ROOT;
        let mut walked = String::from("/");
        for part in path.split('/').filter(|p| !p.is_empty()) {
            walked = join_path(&walked, part);
            current = match self.resolve(&walked) {
                Ok(id) => id,
                Err(_) => self.insert(current, part, NodeBody::Group(Vec::new()))?,
            };
            if !matches!(self.nodes[current].body, NodeBody::Group(_)) {
                return Err(Error::Validation {
                    field: walked,
                    message: "exists and is not a group".to_string(),
                });
            }
        }
        Ok(current)
    }

    fn add_link(&mut self, group: usize, name: &str, link: Link) -> Result<()> {
        let NodeBody::Group(links) = &mut self.nodes[group].body else {
            return Err(Error::Validation {
                field: name.to_string(),
                message: "parent is not a group".to_string(),
            });
        };
        if links.iter().any(|(n, _)| n == name) {
            return Err(Error::Validation {
                field: name.to_string(),
                message: "name already exists in group".to_string(),
            });
        }
        links.push((name.to_string(), link));
        Ok(())
    }

    fn insert(&mut self, group: usize, name: &str, body: NodeBody) -> Result<usize> {
        let id = self.nodes.len();
        self.add_link(group, name, Link::Hard(id))?;
        self.nodes.push(Node::new(body));
        Ok(id)
    }

    fn split_path(path: &str) -> Result<(String, String)> {
        let path = normalize_path(path);
        match path.rsplit_once('/') {
            Some((_, "")) | None => Err(Error::Validation {
                field: path,
                message: "the root group cannot be replaced".to_string(),
            }),
            Some((parent, name)) => {
                let parent = if parent.is_empty() { "/" } else { parent };
                Ok((parent.to_string(), name.to_string()))
            }
        }
    }

    fn new_member(&mut self, path: &str, body: NodeBody) -> Result<ObjectId> {
        let (parent, name) = Self::split_path(path)?;
        let group = self.ensure_group(&parent)?;
        let id = self.insert(group, &name, body)?;
        Ok(ObjectId(id as u64))
    }

    /// Create a group and any missing parents; existing groups are reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a path component is not a group.
    pub fn create_group(&mut self, path: &str) -> Result<ObjectId> {
        Ok(ObjectId(self.ensure_group(path)? as u64))
    }

    /// Create a zero-filled, contiguous dataset; `&[]` makes a scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name is taken or a parent is not
    /// a group.
    pub fn create_dataset(&mut self, path: &str, dtype: Datatype, shape: &[u64]) -> Result<ObjectId> {
        self.new_dataset(path, dtype, Some(shape.to_vec()))
    }

    /// Create a dataset with a null dataspace.
    ///
    /// # Errors
    ///
    /// See [`MemoryContainer::create_dataset`].
    pub fn create_empty_dataset(&mut self, path: &str, dtype: Datatype) -> Result<ObjectId> {
        self.new_dataset(path, dtype, None)
    }

    fn new_dataset(
        &mut self,
        path: &str,
        dtype: Datatype,
        shape: Option<Vec<u64>>,
    ) -> Result<ObjectId> {
        let node = DatasetNode {
            dtype,
            maxshape: shape.clone(),
            shape,
            layout: Layout::Contiguous,
            chunks: None,
            compression: None,
            data: None,
        };
        self.new_member(path, NodeBody::Dataset(Box::new(node)))
    }

    /// Create an object that is neither group nor dataset, such as a
    /// committed datatype.
    ///
    /// # Errors
    ///
    /// See [`MemoryContainer::create_dataset`].
    pub fn create_other(&mut self, path: &str) -> Result<ObjectId> {
        self.new_member(path, NodeBody::Other)
    }

    /// Replace a dataset's contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the array shape differs from the
    /// dataset shape.
    pub fn write_dataset(&mut self, path: &str, data: Array) -> Result<()> {
        let ds = self.dataset_mut(path)?;
        if ds.shape.as_deref() != Some(data.shape()) {
            return Err(Error::Validation {
                field: path.to_string(),
                message: format!(
                    "data shape {:?} does not match dataset shape {:?}",
                    data.shape(),
                    ds.shape
                ),
            });
        }
        ds.data = Some(data);
        Ok(())
    }

    /// Set a dataset's storage layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no dataset at `path`.
    pub fn set_layout(&mut self, path: &str, layout: Layout) -> Result<()> {
        self.dataset_mut(path)?.layout = layout;
        Ok(())
    }

    /// Make a dataset chunked, optionally compressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no dataset at `path`.
    pub fn set_chunks(
        &mut self,
        path: &str,
        chunks: &[u64],
        compression: Option<Compression>,
    ) -> Result<()> {
        let ds = self.dataset_mut(path)?;
        ds.layout = Layout::Chunked;
        ds.chunks = Some(chunks.to_vec());
        ds.compression = compression;
        Ok(())
    }

    /// Set a dataset's maximum shape; use [`UNLIMITED`] for unbounded axes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no dataset at `path`.
    pub fn set_maxshape(&mut self, path: &str, maxshape: &[u64]) -> Result<()> {
        self.dataset_mut(path)?.maxshape = Some(maxshape.to_vec());
        Ok(())
    }

    /// Add a second name for an existing object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `target` does not exist and
    /// [`Error::Validation`] if `path` is taken.
    pub fn link_hard(&mut self, path: &str, target: &str) -> Result<()> {
        let id = self.resolve(target)?;
        let (parent, name) = Self::split_path(path)?;
        let group = self.ensure_group(&parent)?;
        self.add_link(group, &name, Link::Hard(id))
    }

    /// Add a soft link; the target need not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `path` is taken.
    pub fn link_soft(&mut self, path: &str, target: &str) -> Result<()> {
        let (parent, name) = Self::split_path(path)?;
        let group = self.ensure_group(&parent)?;
        self.add_link(group, &name, Link::Soft(target.to_string()))
    }

    /// Add an external link into another file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `path` is taken.
    pub fn link_external(&mut self, path: &str, file: &str, target: &str) -> Result<()> {
        let (parent, name) = Self::split_path(path)?;
        let group = self.ensure_group(&parent)?;
        self.add_link(
            group,
            &name,
            Link::External {
                file: file.to_string(),
                path: target.to_string(),
            },
        )
    }

    fn push_attr(&mut self, path: &str, attr: StoredAttr) -> Result<()> {
        let id = self.resolve(path)?;
        let attrs = &mut self.nodes[id].attrs;
        match attrs.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => *existing = attr,
            None => attrs.push(attr),
        }
        Ok(())
    }

    /// Attach or replace an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no object at `path`.
    pub fn set_attr(&mut self, path: &str, name: &str, dtype: Datatype, value: Value) -> Result<()> {
        let shape = match &value {
            Value::Scalar(_) => Vec::new(),
            Value::Array(array) => array.shape().to_vec(),
        };
        self.push_attr(
            path,
            StoredAttr {
                name: name.to_string(),
                dtype,
                shape: Some(shape),
                value: Some(value),
            },
        )
    }

    /// Attach a UTF-8 string attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no object at `path`.
    pub fn set_attr_str(&mut self, path: &str, name: &str, text: &str) -> Result<()> {
        self.set_attr(
            path,
            name,
            Datatype::vlen_str(CharacterSet::Utf8),
            Value::Scalar(Scalar::Str(text.to_string())),
        )
    }

    /// Attach an attribute with a null dataspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no object at `path`.
    pub fn set_attr_empty(&mut self, path: &str, name: &str, dtype: Datatype) -> Result<()> {
        self.push_attr(
            path,
            StoredAttr {
                name: name.to_string(),
                dtype,
                shape: None,
                value: None,
            },
        )
    }

    /// Attach an attribute whose value cannot be read back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no object at `path`.
    pub fn set_attr_unreadable(
        &mut self,
        path: &str,
        name: &str,
        dtype: Datatype,
        shape: &[u64],
    ) -> Result<()> {
        self.push_attr(
            path,
            StoredAttr {
                name: name.to_string(),
                dtype,
                shape: Some(shape.to_vec()),
                value: None,
            },
        )
    }

    /// Load a JSON snapshot; the container is named after `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, [`Error::Snapshot`]
    /// for malformed JSON and [`Error::Validation`] for inconsistent content.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut container = Self::from_json_str(&text)?;
        container.filename = path.display().to_string();
        Ok(container)
    }

    /// Load a JSON snapshot from a string.
    ///
    /// # Errors
    ///
    /// See [`MemoryContainer::from_json_file`].
    pub fn from_json_str(text: &str) -> Result<Self> {
        let snapshot: SnapshotSpec = serde_json::from_str(text)?;
        let mut container = Self::new(snapshot.filename.unwrap_or_default());
        let mut pending = Vec::new();
        container.load_attrs("/", &snapshot.root.attrs)?;
        container.load_children("/", &snapshot.root.children, &mut pending)?;
        for (path, target) in pending {
            container.retarget_hard(&path, &target)?;
        }
        Ok(container)
    }

    /// Turn the placeholder link at `path` into a hard link to `target`,
    /// keeping its position among the group's members.
    fn retarget_hard(&mut self, path: &str, target: &str) -> Result<()> {
        let id = self.resolve(target)?;
        let (parent, name) = Self::split_path(path)?;
        let group = self.resolve(&parent)?;
        let NodeBody::Group(links) = &mut self.nodes[group].body else {
            return Err(Error::not_found(path));
        };
        let (_, link) = links
            .iter_mut()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| Error::not_found(path))?;
        *link = Link::Hard(id);
        Ok(())
    }

    fn load_children(
        &mut self,
        group: &str,
        children: &Map<String, Json>,
        pending: &mut Vec<(String, String)>,
    ) -> Result<()> {
        for (name, entry) in children {
            let path = join_path(group, name);
            match EntrySpec::deserialize(entry)? {
                EntrySpec::Group(spec) => {
                    self.create_group(&path)?;
                    self.load_attrs(&path, &spec.attrs)?;
                    self.load_children(&path, &spec.children, pending)?;
                }
                EntrySpec::Dataset(spec) => self.load_dataset(&path, *spec)?,
                EntrySpec::Object { attrs } => {
                    self.create_other(&path)?;
                    self.load_attrs(&path, &attrs)?;
                }
                EntrySpec::Hardlink { target } => {
                    // Targets may appear later in the document, so hold the
                    // member's place with a soft link until everything exists.
                    let target = normalize_path(&target);
                    self.link_soft(&path, &target)?;
                    pending.push((path, target));
                }
                EntrySpec::Softlink { target } => self.link_soft(&path, &target)?,
                EntrySpec::External { file, path: target } => {
                    self.link_external(&path, &file, &target)?;
                }
            }
        }
        Ok(())
    }

    fn load_dataset(&mut self, path: &str, spec: DatasetSpec) -> Result<()> {
        let dtype = spec.dtype.into_datatype()?;
        let shape = match (&spec.shape, &spec.data) {
            (Some(shape), _) => Some(shape.clone()),
            (None, Some(data)) => Some(infer_shape(data)),
            (None, None) => None,
        };
        match &shape {
            Some(dims) => self.create_dataset(path, dtype.clone(), dims)?,
            None => self.create_empty_dataset(path, dtype.clone())?,
        };
        if let Some(maxshape) = &spec.maxshape {
            let dims: Vec<u64> = maxshape.iter().map(|d| d.unwrap_or(UNLIMITED)).collect();
            self.set_maxshape(path, &dims)?;
        }
        if let Some(layout) = spec.layout {
            self.set_layout(path, layout)?;
        }
        if let Some(chunks) = &spec.chunks {
            self.set_chunks(path, chunks, spec.compression.clone())?;
        }
        if let (Some(data), Some(dims)) = (&spec.data, shape) {
            let values = flatten_json(data, &dtype)?;
            let array = Array::new(dims, values).map_err(|e| Error::Validation {
                field: path.to_string(),
                message: e.to_string(),
            })?;
            self.write_dataset(path, array)?;
        }
        self.load_attrs(path, &spec.attrs)
    }

    fn load_attrs(&mut self, path: &str, attrs: &Map<String, Json>) -> Result<()> {
        for (name, raw) in attrs {
            match raw {
                Json::Object(fields) if fields.contains_key("dtype") => {
                    let spec = AttrSpec::deserialize(raw)?;
                    let dtype = spec.dtype.into_datatype()?;
                    match (spec.value, spec.shape) {
                        (_, None) if spec.empty => self.set_attr_empty(path, name, dtype)?,
                        (None, shape) => {
                            self.set_attr_unreadable(path, name, dtype, &shape.unwrap_or_default())?;
                        }
                        (Some(value), _) => {
                            let value = json_to_value(&value, &dtype)?;
                            self.set_attr(path, name, dtype, value)?;
                        }
                    }
                }
                other => {
                    let dtype = infer_dtype(other);
                    let value = json_to_value(other, &dtype)?;
                    self.set_attr(path, name, dtype, value)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct SnapshotSpec {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    root: GroupSpec,
}

#[derive(Deserialize, Default)]
struct GroupSpec {
    #[serde(default)]
    attrs: Map<String, Json>,
    #[serde(default)]
    children: Map<String, Json>,
}

#[derive(Deserialize)]
struct DatasetSpec {
    dtype: DtypeSpec,
    #[serde(default)]
    shape: Option<Vec<u64>>,
    #[serde(default)]
    maxshape: Option<Vec<Option<u64>>>,
    #[serde(default)]
    layout: Option<Layout>,
    #[serde(default)]
    chunks: Option<Vec<u64>>,
    #[serde(default)]
    compression: Option<Compression>,
    #[serde(default)]
    data: Option<Json>,
    #[serde(default)]
    attrs: Map<String, Json>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EntrySpec {
    Group(GroupSpec),
    Dataset(Box<DatasetSpec>),
    Object {
        #[serde(default)]
        attrs: Map<String, Json>,
    },
    Hardlink {
        target: String,
    },
    Softlink {
        target: String,
    },
    External {
        file: String,
        path: String,
    },
}

#[derive(Deserialize)]
struct AttrSpec {
    dtype: DtypeSpec,
    #[serde(default)]
    shape: Option<Vec<u64>>,
    #[serde(default)]
    value: Option<Json>,
    #[serde(default)]
    empty: bool,
}

/// A datatype written either as a type code or in full.
#[derive(Deserialize)]
#[serde(untagged)]
enum DtypeSpec {
    Code(String),
    Full(Datatype),
}

impl DtypeSpec {
    fn into_datatype(self) -> Result<Datatype> {
        match self {
            Self::Code(code) => Datatype::from_code(&code),
            Self::Full(dtype) => Ok(dtype),
        }
    }
}

fn infer_shape(data: &Json) -> Vec<u64> {
    let mut shape = Vec::new();
    let mut current = data;
    while let Json::Array(items) = current {
        shape.push(items.len() as u64);
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

fn infer_dtype(raw: &Json) -> Datatype {
    let mut leaves = Vec::new();
    collect_leaves(raw, &mut leaves);
    if leaves.iter().any(|v| v.is_string()) {
        Datatype::vlen_str(CharacterSet::Utf8)
    } else if leaves.iter().any(|v| v.is_boolean()) {
        Datatype::boolean()
    } else if leaves.iter().any(|v| v.is_f64()) {
        Datatype::float(64)
    } else if leaves.iter().any(|v| v.is_u64() && !v.is_i64()) {
        Datatype::uint(64)
    } else {
        Datatype::int(64)
    }
}

fn collect_leaves<'a>(raw: &'a Json, out: &mut Vec<&'a Json>) {
    match raw {
        Json::Array(items) => items.iter().for_each(|item| collect_leaves(item, out)),
        leaf => out.push(leaf),
    }
}

fn json_to_value(raw: &Json, dtype: &Datatype) -> Result<Value> {
    match raw {
        Json::Array(_) => {
            let shape = infer_shape(raw);
            let values = flatten_json(raw, dtype)?;
            Ok(Value::Array(Array::new(shape, values)?))
        }
        leaf => Ok(Value::Scalar(json_to_scalar(leaf, dtype)?)),
    }
}

fn flatten_json(raw: &Json, dtype: &Datatype) -> Result<Vec<Scalar>> {
    let mut leaves = Vec::new();
    collect_leaves(raw, &mut leaves);
    leaves.into_iter().map(|v| json_to_scalar(v, dtype)).collect()
}

fn json_to_scalar(raw: &Json, dtype: &Datatype) -> Result<Scalar> {
    let mismatch = || Error::Validation {
        field: "value".to_string(),
        message: format!("{raw} is not a valid {}", fmt_dtype(dtype)),
    };
    let scalar = match dtype {
        Datatype::Integer { signed: false, .. } | Datatype::Bitfield { .. } => {
            Scalar::UInt(raw.as_u64().ok_or_else(mismatch)?)
        }
        Datatype::Integer { signed: true, .. } => Scalar::Int(raw.as_i64().ok_or_else(mismatch)?),
        Datatype::Float { .. } => Scalar::Float(raw.as_f64().ok_or_else(mismatch)?),
        Datatype::String {
            size: StringSize::Fixed(_),
            ..
        } => Scalar::Bytes(raw.as_str().ok_or_else(mismatch)?.as_bytes().to_vec()),
        Datatype::String { .. } => Scalar::Str(raw.as_str().ok_or_else(mismatch)?.to_string()),
        Datatype::Enum { .. } => match raw {
            Json::Bool(b) => Scalar::Bool(*b),
            other => Scalar::Int(other.as_i64().ok_or_else(mismatch)?),
        },
        _ => Scalar::deserialize(raw).map_err(|_| mismatch())?,
    };
    Ok(scalar)
}

impl Container for MemoryContainer {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    fn list_children(&self, group: &str) -> Result<Vec<String>> {
        Ok(self
            .group_links(group)?
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn link_kind(&self, group: &str, name: &str) -> Result<LinkKind> {
        let (_, link) = self
            .group_links(group)?
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::not_found(join_path(group, name)))?;
        Ok(match link {
            Link::Hard(_) => LinkKind::Hard,
            Link::Soft(target) => LinkKind::Soft {
                target: target.clone(),
            },
            Link::External { file, path } => LinkKind::External {
                file: file.clone(),
                path: path.clone(),
            },
        })
    }

    fn identity(&self, path: &str) -> Result<ObjectId> {
        Ok(ObjectId(self.resolve(path)? as u64))
    }

    fn metadata(&self, path: &str) -> Result<ObjectMeta> {
        let node = &self.nodes[self.resolve(path)?];
        let num_attrs = node.attrs.len();
        Ok(match &node.body {
            NodeBody::Group(_) => ObjectMeta::group(num_attrs),
            NodeBody::Dataset(ds) => ObjectMeta {
                kind: ObjectKind::Dataset,
                dtype: Some(ds.dtype.clone()),
                shape: ds.shape.clone(),
                maxshape: ds.maxshape.clone(),
                layout: Some(ds.layout),
                chunks: ds.chunks.clone(),
                compression: ds.compression.clone(),
                num_attrs,
            },
            NodeBody::Other => ObjectMeta {
                kind: ObjectKind::Unknown,
                ..ObjectMeta::group(num_attrs)
            },
        })
    }

    fn attribute_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.nodes[self.resolve(path)?]
            .attrs
            .iter()
            .map(|a| a.name.clone())
            .collect())
    }

    fn attribute_info(&self, path: &str, name: &str) -> Result<AttributeInfo> {
        let attr = self.stored_attr(path, name)?;
        Ok(AttributeInfo {
            dtype: attr.dtype.clone(),
            shape: attr.shape.clone(),
        })
    }

    fn read_attribute(&self, path: &str, name: &str) -> Result<Value> {
        let attr = self.stored_attr(path, name)?;
        attr.value.clone().ok_or_else(|| Error::Read {
            path: format!("{path}@{name}"),
            reason: format!("cannot decode {} data", fmt_dtype(&attr.dtype)),
        })
    }

    fn read_slice(&self, path: &str, selection: &Selection) -> Result<Array> {
        let ds = self.dataset(path)?;
        let Some(shape) = &ds.shape else {
            return Err(Error::Read {
                path: path.to_string(),
                reason: "dataset has an empty dataspace".to_string(),
            });
        };
        if let Some(data) = &ds.data {
            return selection.extract(data);
        }

        // Unwritten datasets read as zeros; only the selected part is built.
        selection.check_bounds(shape)?;
        let out_shape = selection.output_shape(shape);
        if selection.num_elements(shape) > MAX_FILL_ELEMENTS {
            return Err(Error::Read {
                path: path.to_string(),
                reason: "selection is too large to read".to_string(),
            });
        }
        let zero = Scalar::zero_for(&ds.dtype).ok_or_else(|| Error::Read {
            path: path.to_string(),
            reason: format!("cannot decode {} data", fmt_dtype(&ds.dtype)),
        })?;
        Ok(Array::filled(out_shape, &zero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryContainer {
        let mut file = MemoryContainer::new("sample.h5");
        file.create_dataset("/group1/subgroup1/dataset1", Datatype::uint(64), &[200])
            .unwrap();
        file.create_dataset("/group1/dataset2", Datatype::float(32), &[2, 3])
            .unwrap();
        file.set_attr_str("/group1", "string", "foo").unwrap();
        file
    }

    #[test]
    fn test_create_makes_parents() {
        let file = sample();
        assert_eq!(file.list_children("/").unwrap(), vec!["group1"]);
        assert_eq!(
            file.list_children("/group1").unwrap(),
            vec!["subgroup1", "dataset2"]
        );
        assert_eq!(
            file.metadata("/group1/subgroup1").unwrap().kind,
            ObjectKind::Group
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut file = sample();
        let err = file
            .create_dataset("/group1/dataset2", Datatype::int(8), &[1])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_dataset_as_parent_rejected() {
        let mut file = sample();
        assert!(file
            .create_group("/group1/dataset2/inner")
            .is_err());
    }

    #[test]
    fn test_hard_link_shares_identity() {
        let mut file = sample();
        file.link_hard("/synonyms/folder", "/group1/subgroup1").unwrap();
        assert_eq!(
            file.identity("/synonyms/folder").unwrap(),
            file.identity("/group1/subgroup1").unwrap()
        );
        assert_eq!(file.link_kind("/synonyms", "folder").unwrap(), LinkKind::Hard);
    }

    #[test]
    fn test_soft_and_external_links() {
        let mut file = sample();
        file.link_soft("/latest", "/group1/dataset2").unwrap();
        file.link_soft("/dangling", "/nowhere").unwrap();
        file.link_external("/remote", "other.h5", "/data").unwrap();

        assert_eq!(
            file.link_kind("/", "latest").unwrap(),
            LinkKind::Soft {
                target: "/group1/dataset2".to_string()
            }
        );
        assert!(file.exists("/latest"));
        assert!(!file.exists("/dangling"));
        assert!(!file.exists("/remote"));
        assert_eq!(
            file.link_kind("/", "remote").unwrap(),
            LinkKind::External {
                file: "other.h5".to_string(),
                path: "/data".to_string()
            }
        );
    }

    #[test]
    fn test_soft_link_cycle_terminates() {
        let mut file = MemoryContainer::new("loop.h5");
        file.link_soft("/a", "/b").unwrap();
        file.link_soft("/b", "/a").unwrap();
        assert!(!file.exists("/a"));
    }

    #[test]
    fn test_attributes() {
        let mut file = sample();
        file.set_attr_empty("/group1", "nothing", Datatype::int(32))
            .unwrap();
        file.set_attr_unreadable("/group1", "broken", Datatype::Other { size: 4 }, &[2])
            .unwrap();

        assert_eq!(
            file.attribute_names("/group1").unwrap(),
            vec!["string", "nothing", "broken"]
        );
        assert_eq!(
            file.read_attribute("/group1", "string").unwrap(),
            Value::Scalar(Scalar::Str("foo".to_string()))
        );
        assert_eq!(file.attribute_info("/group1", "nothing").unwrap().shape, None);
        assert!(matches!(
            file.read_attribute("/group1", "broken"),
            Err(Error::Read { .. })
        ));
        assert_eq!(file.metadata("/group1").unwrap().num_attrs, 3);
    }

    #[test]
    fn test_read_slice_zero_filled() {
        let file = sample();
        let array = file
            .read_slice("/group1/dataset2", &Selection::All)
            .unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert!(array.data().iter().all(|v| *v == Scalar::Float(0.0)));
    }

    #[test]
    fn test_read_slice_huge_unwritten_dataset() {
        let mut file = MemoryContainer::new("big.h5");
        file.create_dataset("/big", Datatype::int(64), &[u64::MAX / 2])
            .unwrap();
        let sample = file
            .read_slice("/big", &Selection::slice(&[0..10]))
            .unwrap();
        assert_eq!(sample.shape(), &[10]);
        assert!(sample.data().iter().all(|v| *v == Scalar::Int(0)));

        assert!(matches!(
            file.read_slice("/big", &Selection::All),
            Err(Error::Read { .. })
        ));
        assert!(matches!(
            file.read_slice("/big", &Selection::slice(&[u64::MAX / 2..u64::MAX / 2 + 1])),
            Err(Error::Selection { .. })
        ));
    }

    #[test]
    fn test_write_and_slice() {
        let mut file = sample();
        let data = (0..6).map(|i| Scalar::Float(f64::from(i))).collect();
        file.write_dataset("/group1/dataset2", Array::new(vec![2, 3], data).unwrap())
            .unwrap();
        let out = file
            .read_slice("/group1/dataset2", &Selection::slice(&[1..2, 0..2]))
            .unwrap();
        assert_eq!(out.data(), &[Scalar::Float(3.0), Scalar::Float(4.0)]);

        let wrong = Array::from_vec(vec![Scalar::Float(1.0)]);
        assert!(file.write_dataset("/group1/dataset2", wrong).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "filename": "snap.h5",
            "root": {
                "attrs": {"title": "demo", "scale": [1.5, 2.0]},
                "children": {
                    "zeta": {"type": "group"},
                    "alpha": {
                        "type": "dataset",
                        "dtype": "<i2",
                        "data": [[1, 2], [3, 4]],
                        "maxshape": [null, 2],
                        "chunks": [1, 2],
                        "compression": {"name": "gzip", "options": "4"}
                    },
                    "again": {"type": "hardlink", "target": "/zeta"},
                    "soft": {"type": "softlink", "target": "/alpha"},
                    "typ": {"type": "object"}
                }
            }
        }"#;
        let file = MemoryContainer::from_json_str(json).unwrap();
        assert_eq!(file.filename(), "snap.h5");
        assert_eq!(
            file.list_children("/").unwrap(),
            vec!["zeta", "alpha", "again", "soft", "typ"]
        );
        let meta = file.metadata("/alpha").unwrap();
        assert_eq!(meta.shape, Some(vec![2, 2]));
        assert_eq!(meta.maxshape, Some(vec![UNLIMITED, 2]));
        assert_eq!(meta.layout, Some(Layout::Chunked));
        assert_eq!(meta.dtype, Some(Datatype::int(16)));
        assert_eq!(
            file.identity("/again").unwrap(),
            file.identity("/zeta").unwrap()
        );
        assert_eq!(file.metadata("/typ").unwrap().kind, ObjectKind::Unknown);
        assert_eq!(
            file.attribute_info("/", "scale").unwrap().dtype,
            Datatype::float(64)
        );
    }

    #[test]
    fn test_from_json_forward_hardlink_keeps_order() {
        let json = r#"{"root": {"children": {
            "first": {"type": "hardlink", "target": "/later/data"},
            "middle": {"type": "group"},
            "later": {"type": "group", "children": {
                "data": {"type": "dataset", "dtype": "<i4", "shape": [2]},
                "back": {"type": "hardlink", "target": "middle"}
            }}
        }}}"#;
        let file = MemoryContainer::from_json_str(json).unwrap();
        assert_eq!(
            file.list_children("/").unwrap(),
            vec!["first", "middle", "later"]
        );
        assert_eq!(file.link_kind("/", "first").unwrap(), LinkKind::Hard);
        assert_eq!(
            file.identity("/first").unwrap(),
            file.identity("/later/data").unwrap()
        );
        assert_eq!(file.list_children("/later").unwrap(), vec!["data", "back"]);
        assert_eq!(
            file.identity("/later/back").unwrap(),
            file.identity("/middle").unwrap()
        );
    }

    #[test]
    fn test_from_json_missing_hardlink_target() {
        let json = r#"{"root": {"children": {
            "dangling": {"type": "hardlink", "target": "/nowhere"}
        }}}"#;
        assert!(matches!(
            MemoryContainer::from_json_str(json),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_from_json_explicit_attrs() {
        let json = r#"{"root": {"attrs": {
            "n": {"dtype": "uint8", "value": 7},
            "none": {"dtype": "int32", "empty": true},
            "bad": {"dtype": "<f8", "shape": [3]}
        }}}"#;
        let file = MemoryContainer::from_json_str(json).unwrap();
        assert_eq!(
            file.read_attribute("/", "n").unwrap(),
            Value::Scalar(Scalar::UInt(7))
        );
        assert_eq!(file.attribute_info("/", "none").unwrap().shape, None);
        assert!(file.read_attribute("/", "bad").is_err());
    }

    #[test]
    fn test_from_json_rejects_bad_data() {
        let json = r#"{"root": {"children": {
            "d": {"type": "dataset", "dtype": "uint8", "shape": [3], "data": [1, 2]}
        }}}"#;
        assert!(MemoryContainer::from_json_str(json).is_err());
        assert!(matches!(
            MemoryContainer::from_json_str("{"),
            Err(Error::Snapshot(_))
        ));
    }
}
