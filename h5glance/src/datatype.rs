//! HDF5 datatype descriptors and their short human-readable names.
//!
//! [`Datatype`] mirrors the HDF5 type classes closely enough to tell a
//! standard little-endian `int32` apart from a six-byte custom integer, which
//! is all the formatters need. [`fmt_dtype`] is the one-line summary used in
//! trees and dataset views; [`dtype_description`] is the longer tooltip text.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::fmt_shape;

/// Byte order of numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Least significant byte first.
    LittleEndian,
    /// Most significant byte first.
    BigEndian,
}

/// Character set of string data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSet {
    /// 7-bit ASCII.
    Ascii,
    /// UTF-8.
    Utf8,
}

impl CharacterSet {
    /// Display name of the character set.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ASCII",
            Self::Utf8 => "UTF-8",
        }
    }
}

/// What a reference datatype points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Reference to a whole object.
    Object,
    /// Reference to a region of a dataset.
    DatasetRegion,
}

/// Storage size of a string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringSize {
    /// Fixed number of bytes per element.
    Fixed(u32),
    /// Variable-length strings.
    Variable,
}

/// Bit layout of a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatLayout {
    /// Number of significant bits.
    pub precision: u16,
    /// Bit offset of the first significant bit.
    pub offset: u16,
    /// Bit position of the sign.
    pub sign_location: u8,
    /// Bit position of the exponent.
    pub exponent_location: u8,
    /// Exponent width in bits.
    pub exponent_size: u8,
    /// Bit position of the mantissa.
    pub mantissa_location: u8,
    /// Mantissa width in bits.
    pub mantissa_size: u8,
    /// Exponent bias.
    pub exponent_bias: u32,
}

impl FloatLayout {
    /// The IEEE 754 layout for a float of `size` bytes, if there is one.
    #[must_use]
    pub const fn ieee(size: u32) -> Option<Self> {
        let (sign, exp_size, mant_size, bias) = match size {
            2 => (15, 5, 10, 15),
            4 => (31, 8, 23, 127),
            8 => (63, 11, 52, 1023),
            _ => return None,
        };
        Some(Self {
            precision: (size * 8) as u16,
            offset: 0,
            sign_location: sign,
            exponent_location: mant_size,
            exponent_size: exp_size,
            mantissa_location: 0,
            mantissa_size: mant_size,
            exponent_bias: bias,
        })
    }
}

/// A member of a compound datatype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundMember {
    /// Member name.
    pub name: String,
    /// Member datatype.
    pub datatype: Datatype,
}

/// An HDF5 datatype descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Datatype {
    /// Fixed-point integers.
    Integer {
        /// Size in bytes.
        size: u32,
        /// Two's-complement signed.
        signed: bool,
        /// Byte order.
        byte_order: ByteOrder,
        /// Number of significant bits.
        precision: u16,
        /// Bit offset of the first significant bit.
        offset: u16,
    },
    /// Floating-point numbers.
    Float {
        /// Size in bytes.
        size: u32,
        /// Byte order.
        byte_order: ByteOrder,
        /// Bit layout.
        layout: FloatLayout,
    },
    /// The deprecated time class.
    Time {
        /// Size in bytes.
        size: u32,
    },
    /// Bit fields.
    Bitfield {
        /// Size in bytes.
        size: u32,
        /// Byte order.
        byte_order: ByteOrder,
    },
    /// Uninterpreted bytes with an optional tag.
    Opaque {
        /// Size in bytes.
        size: u32,
        /// Descriptive tag, possibly empty.
        tag: String,
    },
    /// Fixed or variable length strings.
    String {
        /// Element size.
        size: StringSize,
        /// Character set.
        charset: CharacterSet,
    },
    /// Variable-length sequences of a base type.
    VarLen {
        /// Element type.
        base: Box<Datatype>,
    },
    /// Fixed-size arrays of a base type.
    Array {
        /// Element type.
        base: Box<Datatype>,
        /// Array dimensions.
        dims: Vec<u64>,
    },
    /// Records of named members.
    Compound {
        /// Size in bytes.
        size: u32,
        /// Members in declaration order.
        members: Vec<CompoundMember>,
    },
    /// Enumerations over an integer base type.
    Enum {
        /// Integer base type.
        base: Box<Datatype>,
        /// Member names in declaration order.
        members: Vec<String>,
    },
    /// Object or region references.
    Reference {
        /// Reference flavour.
        kind: ReferenceKind,
    },
    /// Anything this crate does not model.
    Other {
        /// Size in bytes.
        size: u32,
    },
}

impl Datatype {
    /// Standard little-endian signed integer of `bits` bits.
    #[must_use]
    pub fn int(bits: u16) -> Self {
        Self::Integer {
            size: u32::from(bits / 8),
            signed: true,
            byte_order: ByteOrder::LittleEndian,
            precision: bits,
            offset: 0,
        }
    }

    /// Standard little-endian unsigned integer of `bits` bits.
    #[must_use]
    pub fn uint(bits: u16) -> Self {
        Self::Integer {
            size: u32::from(bits / 8),
            signed: false,
            byte_order: ByteOrder::LittleEndian,
            precision: bits,
            offset: 0,
        }
    }

    /// Standard little-endian IEEE float of `bits` bits (16, 32 or 64).
    ///
    /// Other widths get a layout scaled from the double-precision one and
    /// will format as a custom float.
    #[must_use]
    pub fn float(bits: u16) -> Self {
        let size = u32::from(bits / 8);
        let layout = FloatLayout::ieee(size).unwrap_or(FloatLayout {
            precision: bits,
            offset: 0,
            sign_location: 63,
            exponent_location: 52,
            exponent_size: 11,
            mantissa_location: 0,
            mantissa_size: 52,
            exponent_bias: 1023,
        });
        Self::Float {
            size,
            byte_order: ByteOrder::LittleEndian,
            layout,
        }
    }

    /// HDF5's conventional boolean: an `int8` enum of `FALSE` and `TRUE`.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Enum {
            base: Box::new(Self::int(8)),
            members: vec!["FALSE".to_string(), "TRUE".to_string()],
        }
    }

    /// Variable-length string in the given character set.
    #[must_use]
    pub fn vlen_str(charset: CharacterSet) -> Self {
        Self::String {
            size: StringSize::Variable,
            charset,
        }
    }

    /// Fixed-length string of `size` bytes.
    #[must_use]
    pub fn fixed_str(size: u32, charset: CharacterSet) -> Self {
        Self::String {
            size: StringSize::Fixed(size),
            charset,
        }
    }

    /// The same numeric type with big-endian byte order.
    ///
    /// Non-numeric types are returned unchanged.
    #[must_use]
    pub fn big_endian(self) -> Self {
        match self {
            Self::Integer {
                size,
                signed,
                precision,
                offset,
                ..
            } => Self::Integer {
                size,
                signed,
                byte_order: ByteOrder::BigEndian,
                precision,
                offset,
            },
            Self::Float { size, layout, .. } => Self::Float {
                size,
                byte_order: ByteOrder::BigEndian,
                layout,
            },
            Self::Bitfield { size, .. } => Self::Bitfield {
                size,
                byte_order: ByteOrder::BigEndian,
            },
            other => other,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Integer { size, .. }
            | Self::Float { size, .. }
            | Self::Time { size }
            | Self::Bitfield { size, .. }
            | Self::Opaque { size, .. }
            | Self::Compound { size, .. }
            | Self::Other { size } => u64::from(*size),
            Self::String {
                size: StringSize::Fixed(n),
                ..
            } => u64::from(*n),
            Self::String {
                size: StringSize::Variable,
                ..
            }
            | Self::VarLen { .. } => 16,
            Self::Array { base, dims } => base
                .size()
                .saturating_mul(crate::container::element_count(dims).unwrap_or(u64::MAX)),
            Self::Enum { base, .. } => base.size(),
            Self::Reference {
                kind: ReferenceKind::Object,
            } => 8,
            Self::Reference {
                kind: ReferenceKind::DatasetRegion,
            } => 12,
        }
    }

    /// Parse a numpy-style type code or short name.
    ///
    /// Accepts codes such as `<u8`, `>i4`, `<f4`, `|b1`, `|S5`, `|O` and the
    /// names `int8`…`uint64`, `float16`…`float64`, `bool` and `str`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::Datatype;
    ///
    /// assert_eq!(Datatype::from_code("<u8").unwrap(), Datatype::uint(64));
    /// assert_eq!(Datatype::from_code("float32").unwrap(), Datatype::float(32));
    /// ```
    pub fn from_code(code: &str) -> Result<Self> {
        let invalid = || Error::Validation {
            field: "dtype".to_string(),
            message: format!("unrecognised type code '{code}'"),
        };

        match code {
            "bool" | "|b1" => return Ok(Self::boolean()),
            "str" | "|O" | "O" => return Ok(Self::vlen_str(CharacterSet::Utf8)),
            _ => {}
        }

        for (prefix, ctor) in [
            ("uint", Self::uint as fn(u16) -> Self),
            ("int", Self::int),
            ("float", Self::float),
        ] {
            if let Some(bits) = code.strip_prefix(prefix) {
                let bits: u16 = bits.parse().map_err(|_| invalid())?;
                return match (prefix, bits) {
                    ("float", 16 | 32 | 64) | ("int" | "uint", 8 | 16 | 32 | 64) => Ok(ctor(bits)),
                    _ => Err(invalid()),
                };
            }
        }

        let mut chars = code.chars();
        let (order, kind) = match (chars.next(), chars.next()) {
            (Some(order @ ('<' | '>' | '|' | '=')), Some(kind)) => (order, kind),
            _ => return Err(invalid()),
        };
        let size: u32 = chars.as_str().parse().map_err(|_| invalid())?;
        let bits = u16::try_from(size * 8).map_err(|_| invalid())?;
        let dtype = match kind {
            'i' if matches!(size, 1 | 2 | 4 | 8) => Self::int(bits),
            'u' if matches!(size, 1 | 2 | 4 | 8) => Self::uint(bits),
            'f' if matches!(size, 2 | 4 | 8) => Self::float(bits),
            'S' => Self::fixed_str(size, CharacterSet::Ascii),
            'V' => Self::Opaque {
                size,
                tag: String::new(),
            },
            _ => return Err(invalid()),
        };
        Ok(if order == '>' { dtype.big_endian() } else { dtype })
    }

    fn is_standard_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer { size, precision, offset: 0, .. }
                if matches!(size, 1 | 2 | 4 | 8) && u32::from(*precision) == size * 8
        )
    }

    fn is_standard_float(&self) -> bool {
        match self {
            Self::Float { size, layout, .. } => FloatLayout::ieee(*size) == Some(*layout),
            _ => false,
        }
    }

    fn is_complex(&self) -> Option<&Datatype> {
        match self {
            Self::Compound { members, .. } if members.len() == 2 => {
                let (re, im) = (&members[0], &members[1]);
                (re.name == "r"
                    && im.name == "i"
                    && re.datatype == im.datatype
                    && re.datatype.is_standard_float())
                .then_some(&re.datatype)
            }
            _ => None,
        }
    }

    fn order_char(byte_order: ByteOrder, size: u64) -> char {
        if size == 1 {
            '|'
        } else {
            match byte_order {
                ByteOrder::LittleEndian => '<',
                ByteOrder::BigEndian => '>',
            }
        }
    }

    /// The numpy-style type code used in HTML views, e.g. `<u8` or `|S3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::Datatype;
    ///
    /// assert_eq!(Datatype::uint(64).type_code(), "<u8");
    /// assert_eq!(Datatype::int(16).big_endian().type_code(), ">i2");
    /// assert_eq!(Datatype::boolean().type_code(), "|b1");
    /// ```
    #[must_use]
    pub fn type_code(&self) -> String {
        let size = self.size();
        match self {
            Self::Integer {
                signed, byte_order, ..
            } => {
                let kind = if *signed { 'i' } else { 'u' };
                format!("{}{kind}{size}", Self::order_char(*byte_order, size))
            }
            Self::Bitfield { byte_order, .. } => {
                format!("{}u{size}", Self::order_char(*byte_order, size))
            }
            Self::Float { byte_order, .. } => {
                format!("{}f{size}", Self::order_char(*byte_order, size))
            }
            Self::Enum { base, members } => {
                if members.len() == 2 && members[0] == "FALSE" && members[1] == "TRUE" {
                    "|b1".to_string()
                } else {
                    base.type_code()
                }
            }
            Self::String {
                size: StringSize::Fixed(n),
                ..
            } => format!("|S{n}"),
            Self::String {
                size: StringSize::Variable,
                ..
            }
            | Self::VarLen { .. }
            | Self::Reference { .. } => "|O".to_string(),
            Self::Compound { .. } => match self.is_complex() {
                Some(Self::Float { byte_order, .. }) => {
                    format!("{}c{size}", Self::order_char(*byte_order, size))
                }
                _ => format!("|V{size}"),
            },
            Self::Array { .. } | Self::Opaque { .. } | Self::Time { .. } | Self::Other { .. } => {
                format!("|V{size}")
            }
        }
    }
}

/// Short, preferably standard, name for a datatype.
///
/// # Examples
///
/// ```
/// use h5glance::{fmt_dtype, Datatype};
///
/// assert_eq!(fmt_dtype(&Datatype::float(32)), "float32");
/// assert_eq!(fmt_dtype(&Datatype::uint(64).big_endian()), "uint64 (big-endian)");
/// ```
#[must_use]
pub fn fmt_dtype(dtype: &Datatype) -> String {
    let size = dtype.size();
    match dtype {
        Datatype::Integer {
            signed, byte_order, ..
        } => {
            if dtype.is_standard_integer() {
                let un = if *signed { "" } else { "u" };
                with_order(format!("{un}int{}", size * 8), *byte_order)
            } else {
                let un = if *signed { "" } else { "un" };
                format!("{size}-byte {un}signed integer")
            }
        }
        Datatype::Float { byte_order, .. } => {
            if dtype.is_standard_float() {
                with_order(format!("float{}", size * 8), *byte_order)
            } else {
                format!("custom {size}-byte float")
            }
        }
        Datatype::Bitfield { .. } => format!("{size}-byte bitfield"),
        Datatype::Time { .. } => "time".to_string(),
        Datatype::Opaque { tag, .. } => {
            if tag.is_empty() {
                format!("{size}-byte opaque")
            } else {
                format!("{size}-byte opaque ({tag})")
            }
        }
        Datatype::String {
            size: StringSize::Variable,
            charset,
        } => format!("{} string", charset.name()),
        Datatype::String {
            size: StringSize::Fixed(n),
            charset,
        } => format!("{n}-byte {} string", charset.name()),
        Datatype::VarLen { base } => format!("vlen array of {}", fmt_dtype(base)),
        Datatype::Array { base, dims } => {
            format!("{} array of {}", fmt_shape(Some(dims.as_slice())), fmt_dtype(base))
        }
        Datatype::Compound { members, .. } => {
            let fields: Vec<String> = members
                .iter()
                .map(|m| format!("{}: {}", m.name, fmt_dtype(&m.datatype)))
                .collect();
            format!("({})", fields.join(", "))
        }
        Datatype::Enum { members, .. } => {
            if members.len() >= 5 {
                format!("enum ({} options)", members.len())
            } else {
                format!("enum ({})", members.join(", "))
            }
        }
        Datatype::Reference {
            kind: ReferenceKind::DatasetRegion,
        } => "region ref".to_string(),
        Datatype::Reference {
            kind: ReferenceKind::Object,
        } => "object ref".to_string(),
        Datatype::Other { .. } => format!("unrecognised {size}-byte datatype"),
    }
}

fn with_order(name: String, byte_order: ByteOrder) -> String {
    match byte_order {
        ByteOrder::LittleEndian => name,
        ByteOrder::BigEndian => format!("{name} (big-endian)"),
    }
}

/// A slightly longer description, suitable for a tooltip.
///
/// Only standard integer and float layouts have one.
#[must_use]
pub fn dtype_description(dtype: &Datatype) -> Option<String> {
    let bits = dtype.size() * 8;
    match dtype {
        Datatype::Integer { signed, .. } if dtype.is_standard_integer() => {
            let un = if *signed { "" } else { "un" };
            Some(format!("{bits}-bit {un}signed integer"))
        }
        Datatype::Float { .. } if dtype.is_standard_float() => {
            Some(format!("{bits}-bit floating point"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_float() {
        let ft = Datatype::float(32);
        assert_eq!(fmt_dtype(&ft), "float32");
        assert_eq!(
            dtype_description(&ft).as_deref(),
            Some("32-bit floating point")
        );
    }

    #[test]
    fn test_custom_float() {
        let custom = Datatype::Float {
            size: 2,
            byte_order: ByteOrder::LittleEndian,
            layout: FloatLayout {
                precision: 16,
                offset: 0,
                sign_location: 14,
                exponent_location: 9,
                exponent_size: 5,
                mantissa_location: 0,
                mantissa_size: 9,
                exponent_bias: 53,
            },
        };
        assert_eq!(fmt_dtype(&custom), "custom 2-byte float");
        assert!(dtype_description(&custom).is_none());
    }

    #[test]
    fn test_standard_int() {
        let it = Datatype::int(32);
        assert_eq!(fmt_dtype(&it), "int32");
        assert_eq!(
            dtype_description(&it).as_deref(),
            Some("32-bit signed integer")
        );

        let ut = Datatype::uint(64).big_endian();
        assert_eq!(fmt_dtype(&ut), "uint64 (big-endian)");
        assert_eq!(
            dtype_description(&ut).as_deref(),
            Some("64-bit unsigned integer")
        );
    }

    #[test]
    fn test_custom_int() {
        let six_bytes = Datatype::Integer {
            size: 6,
            signed: false,
            byte_order: ByteOrder::LittleEndian,
            precision: 32,
            offset: 0,
        };
        assert_eq!(fmt_dtype(&six_bytes), "6-byte unsigned integer");
    }

    #[test]
    fn test_string() {
        assert_eq!(
            fmt_dtype(&Datatype::vlen_str(CharacterSet::Utf8)),
            "UTF-8 string"
        );
        assert_eq!(
            fmt_dtype(&Datatype::fixed_str(3, CharacterSet::Ascii)),
            "3-byte ASCII string"
        );
    }

    #[test]
    fn test_compound() {
        let ct = Datatype::Compound {
            size: 8,
            members: vec![
                CompoundMember {
                    name: "x".to_string(),
                    datatype: Datatype::float(32),
                },
                CompoundMember {
                    name: "y".to_string(),
                    datatype: Datatype::float(32),
                },
            ],
        };
        assert_eq!(fmt_dtype(&ct), "(x: float32, y: float32)");
        assert_eq!(ct.type_code(), "|V8");
    }

    #[test]
    fn test_enum() {
        let et = Datatype::Enum {
            base: Box::new(Datatype::int(8)),
            members: vec!["apple".to_string(), "banana".to_string()],
        };
        assert_eq!(fmt_dtype(&et), "enum (apple, banana)");

        let big = Datatype::Enum {
            base: Box::new(Datatype::int(8)),
            members: (0..5).map(|i| format!("m{i}")).collect(),
        };
        assert_eq!(fmt_dtype(&big), "enum (5 options)");
    }

    #[test]
    fn test_vlen() {
        let vt = Datatype::VarLen {
            base: Box::new(Datatype::int(16)),
        };
        assert_eq!(fmt_dtype(&vt), "vlen array of int16");
    }

    #[test]
    fn test_array() {
        let at = Datatype::Array {
            base: Box::new(Datatype::float(64)),
            dims: vec![3, 4],
        };
        assert_eq!(fmt_dtype(&at), "3 × 4 array of float64");
        assert_eq!(at.size(), 96);
    }

    #[test]
    fn test_misc_classes() {
        assert_eq!(
            fmt_dtype(&Datatype::Bitfield {
                size: 2,
                byte_order: ByteOrder::LittleEndian
            }),
            "2-byte bitfield"
        );
        assert_eq!(fmt_dtype(&Datatype::Time { size: 8 }), "time");
        assert_eq!(
            fmt_dtype(&Datatype::Opaque {
                size: 4,
                tag: "jpeg".to_string()
            }),
            "4-byte opaque (jpeg)"
        );
        assert_eq!(
            fmt_dtype(&Datatype::Reference {
                kind: ReferenceKind::Object
            }),
            "object ref"
        );
        assert_eq!(
            fmt_dtype(&Datatype::Reference {
                kind: ReferenceKind::DatasetRegion
            }),
            "region ref"
        );
        assert_eq!(
            fmt_dtype(&Datatype::Other { size: 3 }),
            "unrecognised 3-byte datatype"
        );
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(Datatype::uint(8).type_code(), "|u1");
        assert_eq!(Datatype::float(32).type_code(), "<f4");
        assert_eq!(Datatype::float(64).big_endian().type_code(), ">f8");
        assert_eq!(
            Datatype::fixed_str(5, CharacterSet::Ascii).type_code(),
            "|S5"
        );
        assert_eq!(Datatype::vlen_str(CharacterSet::Utf8).type_code(), "|O");

        let complex = Datatype::Compound {
            size: 16,
            members: vec![
                CompoundMember {
                    name: "r".to_string(),
                    datatype: Datatype::float(64),
                },
                CompoundMember {
                    name: "i".to_string(),
                    datatype: Datatype::float(64),
                },
            ],
        };
        assert_eq!(complex.type_code(), "<c16");
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Datatype::from_code("<i2").unwrap(), Datatype::int(16));
        assert_eq!(
            Datatype::from_code(">u8").unwrap(),
            Datatype::uint(64).big_endian()
        );
        assert_eq!(Datatype::from_code("uint8").unwrap(), Datatype::uint(8));
        assert_eq!(Datatype::from_code("bool").unwrap(), Datatype::boolean());
        assert_eq!(
            Datatype::from_code("|S3").unwrap(),
            Datatype::fixed_str(3, CharacterSet::Ascii)
        );
        assert!(Datatype::from_code("int12").is_err());
        assert!(Datatype::from_code("<q8").is_err());
        assert!(Datatype::from_code("").is_err());
    }

    #[test]
    fn test_serde_tagged_form() {
        let json = r#"{"class": "string", "size": "variable", "charset": "utf8"}"#;
        let dtype: Datatype = serde_json::from_str(json).unwrap();
        assert_eq!(dtype, Datatype::vlen_str(CharacterSet::Utf8));
    }
}
