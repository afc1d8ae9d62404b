//! libhdf5-backed container, enabled by the `hdf5` feature.
//!
//! Structure and values go through the `hdf5` crate. Datatype introspection
//! and link values use `hdf5-sys` directly, since the descriptor API cannot
//! describe non-native layouts such as six-byte integers.

#![allow(unsafe_code)]

use std::collections::hash_map::DefaultHasher;
use std::ffi::{CStr, CString};
use std::hash::{Hash, Hasher};
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_uint, c_void};
use std::path::Path;
use std::ptr;

use hdf5::types::{VarLenAscii, VarLenUnicode};
use hdf5::{Extents, H5Type, Hyperslab, LocationType, SliceOrIndex};
use hdf5_sys::h5::{hsize_t, H5free_memory};
use hdf5_sys::h5a::H5Aread;
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5l::{H5L_info_t, H5L_type_t, H5Lget_info, H5Lget_val, H5Lunpack_elink_val};
use hdf5_sys::h5p::H5P_DEFAULT;
use hdf5_sys::h5t::{
    H5T_class_t, H5T_cset_t, H5T_order_t, H5T_sign_t, H5Tclose, H5Tget_array_dims2,
    H5Tget_array_ndims, H5Tget_class, H5Tget_cset, H5Tget_ebias, H5Tget_fields,
    H5Tget_member_name, H5Tget_member_type, H5Tget_nmembers, H5Tget_offset, H5Tget_order,
    H5Tget_precision, H5Tget_sign, H5Tget_size, H5Tget_super, H5Tget_tag, H5Tis_variable_str,
};

use crate::container::selection::Selection;
use crate::container::value::{Array, Scalar, Value};
use crate::container::{
    AttributeInfo, Compression, Container, Layout, LinkKind, ObjectId, ObjectKind, ObjectMeta,
    UNLIMITED,
};
use crate::datatype::{
    ByteOrder, CharacterSet, CompoundMember, Datatype, FloatLayout, ReferenceKind, StringSize,
};
use crate::error::{Error, Result};

const LINK_VALUE_CAPACITY: usize = 4096;

/// A container reading an HDF5 file through libhdf5.
pub struct Hdf5Container {
    file: hdf5::File,
    filename: String,
}

impl Hdf5Container {
    /// Open an HDF5 file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hdf5`] if libhdf5 cannot open the file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            file: hdf5::File::open(path)?,
            filename: path.display().to_string(),
        })
    }

    fn group(&self, path: &str) -> Result<hdf5::Group> {
        self.file
            .group(path)
            .map_err(|_| Error::not_found(path))
    }

    fn dataset(&self, path: &str) -> Result<hdf5::Dataset> {
        self.file
            .dataset(path)
            .map_err(|_| Error::not_found(path))
    }

    fn location(&self, path: &str) -> Result<hdf5::Location> {
        match self.file.loc_type_by_name(path) {
            Ok(LocationType::Dataset) => Ok((*self.dataset(path)?).clone()),
            Ok(_) => Ok((*self.group(path)?).clone()),
            Err(_) => Err(Error::not_found(path)),
        }
    }

    /// Classify one member by name, without visiting its siblings.
    fn link_type(group: &hdf5::Group, name: &str) -> Result<H5L_type_t> {
        let c_name = CString::new(name).map_err(|_| Error::not_found(name))?;
        let mut info = MaybeUninit::<H5L_info_t>::uninit();
        let status =
            unsafe { H5Lget_info(group.id(), c_name.as_ptr(), info.as_mut_ptr(), H5P_DEFAULT) };
        if status < 0 {
            return Err(Error::not_found(name));
        }
        Ok(unsafe { info.assume_init() }.type_)
    }

    fn link_value(group: &hdf5::Group, name: &str) -> Result<Vec<u8>> {
        let c_name = CString::new(name).map_err(|_| Error::not_found(name))?;
        let mut buf = vec![0u8; LINK_VALUE_CAPACITY];
        let status = unsafe {
            H5Lget_val(
                group.id(),
                c_name.as_ptr(),
                buf.as_mut_ptr().cast::<c_void>(),
                buf.len(),
                H5P_DEFAULT,
            )
        };
        if status < 0 {
            return Err(Error::Read {
                path: name.to_string(),
                reason: "cannot read link value".to_string(),
            });
        }
        Ok(buf)
    }
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Take ownership of a string allocated by libhdf5.
unsafe fn take_h5_string(raw: *mut c_char) -> String {
    if raw.is_null() {
        return String::new();
    }
    let text = CStr::from_ptr(raw).to_string_lossy().into_owned();
    H5free_memory(raw.cast::<c_void>());
    text
}

fn byte_order(id: hid_t) -> ByteOrder {
    match unsafe { H5Tget_order(id) } {
        H5T_order_t::H5T_ORDER_BE => ByteOrder::BigEndian,
        _ => ByteOrder::LittleEndian,
    }
}

/// Describe an HDF5 datatype by its raw properties.
fn describe_type(id: hid_t) -> Datatype {
    let size = unsafe { H5Tget_size(id) } as u32;
    match unsafe { H5Tget_class(id) } {
        H5T_class_t::H5T_INTEGER => Datatype::Integer {
            size,
            signed: unsafe { H5Tget_sign(id) } == H5T_sign_t::H5T_SGN_2,
            byte_order: byte_order(id),
            precision: unsafe { H5Tget_precision(id) } as u16,
            offset: unsafe { H5Tget_offset(id) }.max(0) as u16,
        },
        H5T_class_t::H5T_FLOAT => {
            let (mut spos, mut epos, mut esize, mut mpos, mut msize) = (0, 0, 0, 0, 0);
            unsafe { H5Tget_fields(id, &mut spos, &mut epos, &mut esize, &mut mpos, &mut msize) };
            Datatype::Float {
                size,
                byte_order: byte_order(id),
                layout: FloatLayout {
                    precision: unsafe { H5Tget_precision(id) } as u16,
                    offset: unsafe { H5Tget_offset(id) }.max(0) as u16,
                    sign_location: spos as u8,
                    exponent_location: epos as u8,
                    exponent_size: esize as u8,
                    mantissa_location: mpos as u8,
                    mantissa_size: msize as u8,
                    exponent_bias: unsafe { H5Tget_ebias(id) } as u32,
                },
            }
        }
        H5T_class_t::H5T_TIME => Datatype::Time { size },
        H5T_class_t::H5T_STRING => Datatype::String {
            size: if unsafe { H5Tis_variable_str(id) } > 0 {
                StringSize::Variable
            } else {
                StringSize::Fixed(size)
            },
            charset: if unsafe { H5Tget_cset(id) } == H5T_cset_t::H5T_CSET_UTF8 {
                CharacterSet::Utf8
            } else {
                CharacterSet::Ascii
            },
        },
        H5T_class_t::H5T_BITFIELD => Datatype::Bitfield {
            size,
            byte_order: byte_order(id),
        },
        H5T_class_t::H5T_OPAQUE => Datatype::Opaque {
            size,
            tag: unsafe { take_h5_string(H5Tget_tag(id)) },
        },
        H5T_class_t::H5T_COMPOUND => {
            let n = unsafe { H5Tget_nmembers(id) }.max(0) as c_uint;
            let members = (0..n)
                .map(|i| {
                    let name = unsafe { take_h5_string(H5Tget_member_name(id, i)) };
                    CompoundMember {
                        name,
                        datatype: with_type(unsafe { H5Tget_member_type(id, i) }),
                    }
                })
                .collect();
            Datatype::Compound { size, members }
        }
        H5T_class_t::H5T_REFERENCE => Datatype::Reference {
            kind: if size == 12 {
                ReferenceKind::DatasetRegion
            } else {
                ReferenceKind::Object
            },
        },
        H5T_class_t::H5T_ENUM => {
            let n = unsafe { H5Tget_nmembers(id) }.max(0) as c_uint;
            let members = (0..n)
                .map(|i| unsafe { take_h5_string(H5Tget_member_name(id, i)) })
                .collect();
            Datatype::Enum {
                base: Box::new(with_type(unsafe { H5Tget_super(id) })),
                members,
            }
        }
        H5T_class_t::H5T_VLEN => Datatype::VarLen {
            base: Box::new(with_type(unsafe { H5Tget_super(id) })),
        },
        H5T_class_t::H5T_ARRAY => {
            let ndims = unsafe { H5Tget_array_ndims(id) }.max(0) as usize;
            let mut dims: Vec<hsize_t> = vec![0; ndims];
            unsafe { H5Tget_array_dims2(id, dims.as_mut_ptr()) };
            Datatype::Array {
                base: Box::new(with_type(unsafe { H5Tget_super(id) })),
                dims: dims.into_iter().map(u64::from).collect(),
            }
        }
        _ => Datatype::Other { size },
    }
}

/// Describe a type id we own, then close it.
fn with_type(id: hid_t) -> Datatype {
    if id < 0 {
        return Datatype::Other { size: 0 };
    }
    let dtype = describe_type(id);
    unsafe { H5Tclose(id) };
    dtype
}

fn shape_of(space: &hdf5::Dataspace) -> Result<Option<Vec<u64>>> {
    Ok(match space.extents()? {
        Extents::Null => None,
        Extents::Scalar => Some(Vec::new()),
        Extents::Simple(simple) => Some(simple.dims().into_iter().map(|d| d as u64).collect()),
    })
}

fn to_array<T: Clone>(shape: &[usize], data: Vec<T>, convert: impl Fn(T) -> Scalar) -> Result<Array> {
    let shape = shape.iter().map(|&d| d as u64).collect();
    Array::new(shape, data.into_iter().map(convert).collect())
}

fn read_container<T: H5Type + Clone>(
    reader: &hdf5::Container,
    selection: &Selection,
    convert: impl Fn(T) -> Scalar,
) -> Result<Array> {
    let array = match selection {
        Selection::All => reader.read_dyn::<T>()?,
        Selection::Hyperslab {
            start,
            stride,
            count,
            block,
        } => {
            let slices: Vec<SliceOrIndex> = (0..start.len())
                .map(|i| SliceOrIndex::SliceCount {
                    start: start[i] as usize,
                    step: stride[i] as usize,
                    count: count[i] as usize,
                    block: block[i] as usize,
                })
                .collect();
            reader
                .as_reader()
                .read_slice::<T, _, ndarray::IxDyn>(Hyperslab::from(slices))?
        }
    };
    let shape = array.shape().to_vec();
    to_array(&shape, array.into_iter().collect(), convert)
}

fn read_values(
    reader: &hdf5::Container,
    dtype: &Datatype,
    selection: &Selection,
    path: &str,
) -> Result<Array> {
    match dtype {
        Datatype::Integer { signed: true, .. } => read_container(reader, selection, Scalar::Int),
        Datatype::Integer { signed: false, .. } => read_container(reader, selection, Scalar::UInt),
        Datatype::Float { .. } => read_container(reader, selection, Scalar::Float),
        Datatype::Enum { members, .. }
            if members.len() == 2 && members[0] == "FALSE" && members[1] == "TRUE" =>
        {
            read_container(reader, selection, Scalar::Bool)
        }
        Datatype::String {
            size: StringSize::Variable,
            charset: CharacterSet::Utf8,
        } => read_container(reader, selection, |s: VarLenUnicode| {
            Scalar::Str(s.as_str().to_string())
        }),
        Datatype::String {
            size: StringSize::Variable,
            charset: CharacterSet::Ascii,
        } => read_container(reader, selection, |s: VarLenAscii| {
            Scalar::Str(s.as_str().to_string())
        }),
        other => Err(Error::Read {
            path: path.to_string(),
            reason: format!("cannot decode {} data", crate::fmt_dtype(other)),
        }),
    }
}

/// Fixed-length strings have no fixed Rust type, so read their raw bytes.
fn read_fixed_strings(attr: &hdf5::Attribute, width: usize, shape: &[u64]) -> Result<Array> {
    let len = crate::container::element_count(shape)
        .and_then(|count| usize::try_from(count).ok())
        .and_then(|count| count.checked_mul(width))
        .ok_or_else(|| Error::Read {
            path: attr.name(),
            reason: "attribute is too large to read".to_string(),
        })?;
    let mut buf = vec![0u8; len];
    let dtype = attr.dtype()?;
    let status = unsafe { H5Aread(attr.id(), dtype.id(), buf.as_mut_ptr().cast::<c_void>()) };
    if status < 0 {
        return Err(Error::Read {
            path: attr.name(),
            reason: "cannot read fixed-length strings".to_string(),
        });
    }
    let data = buf
        .chunks(width.max(1))
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            Scalar::Bytes(chunk[..end].to_vec())
        })
        .collect();
    Array::new(shape.to_vec(), data)
}

impl Container for Hdf5Container {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn exists(&self, path: &str) -> bool {
        path == "/" || self.file.loc_info_by_name(path).is_ok()
    }

    fn list_children(&self, group: &str) -> Result<Vec<String>> {
        Ok(self.group(group)?.member_names()?)
    }

    fn link_kind(&self, group: &str, name: &str) -> Result<LinkKind> {
        let group = self.group(group)?;
        match Self::link_type(&group, name)? {
            H5L_type_t::H5L_TYPE_HARD => Ok(LinkKind::Hard),
            H5L_type_t::H5L_TYPE_SOFT => Ok(LinkKind::Soft {
                target: c_string(&Self::link_value(&group, name)?),
            }),
            H5L_type_t::H5L_TYPE_EXTERNAL => {
                let buf = Self::link_value(&group, name)?;
                let mut flags: c_uint = 0;
                let mut file: *const c_char = ptr::null();
                let mut path: *const c_char = ptr::null();
                let status = unsafe {
                    H5Lunpack_elink_val(
                        buf.as_ptr().cast::<c_void>(),
                        buf.len(),
                        &mut flags,
                        &mut file,
                        &mut path,
                    )
                };
                if status < 0 || file.is_null() || path.is_null() {
                    return Err(Error::Read {
                        path: name.to_string(),
                        reason: "cannot unpack external link".to_string(),
                    });
                }
                let (file, path) = unsafe {
                    (
                        CStr::from_ptr(file).to_string_lossy().into_owned(),
                        CStr::from_ptr(path).to_string_lossy().into_owned(),
                    )
                };
                Ok(LinkKind::External { file, path })
            }
            _ => Err(Error::Read {
                path: name.to_string(),
                reason: "unsupported link type".to_string(),
            }),
        }
    }

    fn identity(&self, path: &str) -> Result<ObjectId> {
        let info = self
            .file
            .loc_info_by_name(path)
            .map_err(|_| Error::not_found(path))?;
        let mut hasher = DefaultHasher::new();
        info.fileno.hash(&mut hasher);
        format!("{:?}", info.token).hash(&mut hasher);
        Ok(ObjectId(hasher.finish()))
    }

    fn metadata(&self, path: &str) -> Result<ObjectMeta> {
        let info = self
            .file
            .loc_info_by_name(path)
            .map_err(|_| Error::not_found(path))?;
        let num_attrs = info.num_attrs;
        match info.loc_type {
            LocationType::Group => Ok(ObjectMeta::group(num_attrs)),
            LocationType::Dataset => {
                let ds = self.dataset(path)?;
                let space = ds.space()?;
                let maxshape = match space.extents()? {
                    Extents::Simple(simple) => Some(
                        simple
                            .maxdims()
                            .into_iter()
                            .map(|d| d.map_or(UNLIMITED, |d| d as u64))
                            .collect(),
                    ),
                    _ => None,
                };
                let layout = match ds.layout() {
                    hdf5::dataset::Layout::Compact => Layout::Compact,
                    hdf5::dataset::Layout::Contiguous => Layout::Contiguous,
                    hdf5::dataset::Layout::Chunked => Layout::Chunked,
                    #[allow(unreachable_patterns)]
                    _ => Layout::Virtual,
                };
                let compression = ds.filters().into_iter().find_map(|filter| match filter {
                    hdf5::filters::Filter::Deflate(level) => Some(Compression {
                        name: "gzip".to_string(),
                        options: Some(level.to_string()),
                    }),
                    _ => None,
                });
                Ok(ObjectMeta {
                    kind: ObjectKind::Dataset,
                    dtype: Some(with_type(unsafe { hdf5_sys::h5d::H5Dget_type(ds.id()) })),
                    shape: shape_of(&space)?,
                    maxshape,
                    layout: Some(layout),
                    chunks: ds
                        .chunk()
                        .map(|c| c.into_iter().map(|d| d as u64).collect()),
                    compression,
                    num_attrs,
                })
            }
            _ => Ok(ObjectMeta {
                kind: ObjectKind::Unknown,
                ..ObjectMeta::group(num_attrs)
            }),
        }
    }

    fn attribute_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.location(path)?.attr_names()?)
    }

    fn attribute_info(&self, path: &str, name: &str) -> Result<AttributeInfo> {
        let attr = self
            .location(path)?
            .attr(name)
            .map_err(|_| Error::not_found(format!("{path}@{name}")))?;
        Ok(AttributeInfo {
            dtype: with_type(unsafe { hdf5_sys::h5a::H5Aget_type(attr.id()) }),
            shape: shape_of(&attr.space()?)?,
        })
    }

    fn read_attribute(&self, path: &str, name: &str) -> Result<Value> {
        let info = self.attribute_info(path, name)?;
        let attr = self.location(path)?.attr(name)?;
        let shape = info.shape.clone().unwrap_or_default();
        let array = match &info.dtype {
            Datatype::String {
                size: StringSize::Fixed(width),
                ..
            } => read_fixed_strings(&attr, *width as usize, &shape)?,
            dtype => read_values(&attr, dtype, &Selection::All, &format!("{path}@{name}"))
                .map_err(|e| Error::Read {
                    path: format!("{path}@{name}"),
                    reason: e.to_string(),
                })?,
        };
        if shape.is_empty() {
            let scalar = array.data().first().cloned().ok_or_else(|| Error::Read {
                path: format!("{path}@{name}"),
                reason: "no value stored".to_string(),
            })?;
            Ok(Value::Scalar(scalar))
        } else {
            Ok(Value::Array(array))
        }
    }

    fn read_slice(&self, path: &str, selection: &Selection) -> Result<Array> {
        let meta = self.metadata(path)?;
        let dtype = meta.dtype.ok_or_else(|| Error::not_found(path))?;
        let ds = self.dataset(path)?;
        read_values(&ds, &dtype, selection, path)
    }
}
