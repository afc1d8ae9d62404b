//! Values read from attributes and datasets, and their text forms.
//!
//! [`Array`] knows how to lay itself out the way numpy prints arrays: columns
//! padded to a common width, floats aligned on the decimal point, long axes
//! summarised with `...`, and rows wrapped at a line width.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::container::element_count;
use crate::datatype::{Datatype, StringSize};
use crate::error::{Error, Result};

/// A single element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer too large for `i64`, or read as unsigned.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Decoded text.
    Str(String),
    /// Raw bytes from a fixed-length string.
    #[serde(skip)]
    Bytes(Vec<u8>),
}

impl Scalar {
    /// The zero value stored in a freshly created dataset of `dtype`.
    ///
    /// Returns `None` for types that have no scalar representation, such as
    /// compounds.
    #[must_use]
    pub fn zero_for(dtype: &Datatype) -> Option<Self> {
        match dtype {
            Datatype::Integer { signed: true, .. } => Some(Self::Int(0)),
            Datatype::Integer { signed: false, .. } | Datatype::Bitfield { .. } => {
                Some(Self::UInt(0))
            }
            Datatype::Float { .. } => Some(Self::Float(0.0)),
            Datatype::String {
                size: StringSize::Fixed(_),
                ..
            } => Some(Self::Bytes(Vec::new())),
            Datatype::String { .. } => Some(Self::Str(String::new())),
            Datatype::Enum { members, .. } if is_bool_enum(members) => Some(Self::Bool(false)),
            Datatype::Enum { .. } => Some(Self::Int(0)),
            _ => None,
        }
    }

    /// Python-style `repr`: strings quoted, floats always with a point.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::Scalar;
    ///
    /// assert_eq!(Scalar::Str("foo".into()).repr(), "'foo'");
    /// assert_eq!(Scalar::Float(2.0).repr(), "2.0");
    /// assert_eq!(Scalar::Bool(true).repr(), "True");
    /// ```
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => quote(s),
            other => other.to_string(),
        }
    }
}

fn is_bool_enum(members: &[String]) -> bool {
    members.len() == 2 && members[0] == "FALSE" && members[1] == "TRUE"
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&float_repr(*v)),
            Self::Str(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "b{}", quote(&String::from_utf8_lossy(b))),
        }
    }
}

/// Quote a string the way Python's `repr` does.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Shortest round-trip float text with Python's conventions.
fn float_repr(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let s = format!("{v:e}");
        return fix_exponent(&s);
    }
    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Rewrite Rust's `1.5e-5` exponent as `1.5e-05`.
fn fix_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s.to_string(),
    }
}

/// An n-dimensional array in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<u64>,
    data: Vec<Scalar>,
}

impl Array {
    /// Build an array, checking that `data` fills `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the element count does not match.
    pub fn new(shape: Vec<u64>, data: Vec<Scalar>) -> Result<Self> {
        let expected = element_count(&shape);
        if expected != Some(data.len() as u64) {
            return Err(Error::Validation {
                field: "data".to_string(),
                message: format!(
                    "{} values do not fill shape {:?} ({} elements)",
                    data.len(),
                    shape,
                    expected.map_or_else(|| "too many".to_string(), |n| n.to_string())
                ),
            });
        }
        Ok(Self { shape, data })
    }

    /// A one-dimensional array.
    #[must_use]
    pub fn from_vec(data: Vec<Scalar>) -> Self {
        Self {
            shape: vec![data.len() as u64],
            data,
        }
    }

    /// An array of `shape` filled with `value`.
    #[must_use]
    pub fn filled(shape: Vec<u64>, value: &Scalar) -> Self {
        let len = shape.iter().product::<u64>();
        let data = (0..len).map(|_| value.clone()).collect();
        Self { shape, data }
    }

    /// Dimensions of the array.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Elements in row-major order.
    #[must_use]
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The same elements under a new shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the element counts differ.
    pub fn reshape(self, shape: Vec<u64>) -> Result<Self> {
        Self::new(shape, self.data)
    }

    /// Render like `numpy.array2string`.
    #[must_use]
    pub fn format_with(&self, options: &ArrayFormat) -> String {
        if self.shape.is_empty() {
            return self.data.first().map(ToString::to_string).unwrap_or_default();
        }
        if self.data.is_empty() {
            return "[]".to_string();
        }

        let summarise = options
            .threshold
            .is_some_and(|limit| self.data.len() > limit);
        let grid = Grid {
            shape: &self.shape,
            edge_items: options.edge_items,
            summarise,
        };

        let mut shown = Vec::new();
        grid.collect(0, 0, &mut shown);
        let cells = format_cells(&self.data, &shown, options.precision);

        let mut out = String::new();
        grid.render(0, 0, &cells, options.line_width, &mut out);
        out
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(&ArrayFormat::default()))
    }
}

/// Print options for [`Array::format_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayFormat {
    /// Maximum fraction digits for floats.
    pub precision: usize,
    /// Summarise arrays with more elements than this; `None` never does.
    pub threshold: Option<usize>,
    /// Items kept at each end of a summarised axis.
    pub edge_items: usize,
    /// Wrap rows longer than this many characters.
    pub line_width: usize,
}

impl ArrayFormat {
    /// Compact form used for attribute values on a single tree line.
    #[must_use]
    pub const fn attribute() -> Self {
        Self {
            precision: 5,
            threshold: Some(10),
            edge_items: 3,
            line_width: 75,
        }
    }

    /// Full listing of dataset contents, wrapped at `line_width`.
    #[must_use]
    pub const fn full(line_width: usize) -> Self {
        Self {
            precision: 8,
            threshold: None,
            edge_items: 3,
            line_width,
        }
    }
}

impl Default for ArrayFormat {
    fn default() -> Self {
        Self {
            precision: 8,
            threshold: Some(1000),
            edge_items: 3,
            line_width: 75,
        }
    }
}

/// Which indices of an axis are printed; `None` marks the `...` gap.
fn axis_indices(len: usize, edge: usize, summarise: bool) -> Vec<Option<usize>> {
    if summarise && len > 2 * edge {
        (0..edge)
            .map(Some)
            .chain(std::iter::once(None))
            .chain((len - edge..len).map(Some))
            .collect()
    } else {
        (0..len).map(Some).collect()
    }
}

struct Grid<'a> {
    shape: &'a [u64],
    edge_items: usize,
    summarise: bool,
}

impl Grid<'_> {
    fn stride(&self, axis: usize) -> usize {
        let elements = element_count(&self.shape[axis + 1..]).unwrap_or(u64::MAX);
        usize::try_from(elements).unwrap_or(usize::MAX)
    }

    fn indices(&self, axis: usize) -> Vec<Option<usize>> {
        axis_indices(self.shape[axis] as usize, self.edge_items, self.summarise)
    }

    fn collect(&self, axis: usize, offset: usize, shown: &mut Vec<usize>) {
        let stride = self.stride(axis);
        for k in self.indices(axis).into_iter().flatten() {
            let at = offset + k * stride;
            if axis + 1 == self.shape.len() {
                shown.push(at);
            } else {
                self.collect(axis + 1, at, shown);
            }
        }
    }

    fn render(
        &self,
        axis: usize,
        offset: usize,
        cells: &[Option<String>],
        line_width: usize,
        out: &mut String,
    ) {
        let stride = self.stride(axis);
        let last_axis = axis + 1 == self.shape.len();
        out.push('[');
        for (i, idx) in self.indices(axis).into_iter().enumerate() {
            if last_axis {
                let word = match idx {
                    Some(k) => cells[offset + k * stride].as_deref().unwrap_or(""),
                    None => "...",
                };
                if i > 0 {
                    let column = out.chars().rev().take_while(|&c| c != '\n').count();
                    if column + 1 + word.chars().count() + 1 > line_width {
                        out.push('\n');
                        out.push_str(&" ".repeat(axis + 1));
                    } else {
                        out.push(' ');
                    }
                }
                out.push_str(word);
            } else {
                if i > 0 {
                    out.push_str(&"\n".repeat(self.shape.len() - axis - 1));
                    out.push_str(&" ".repeat(axis + 1));
                }
                match idx {
                    Some(k) => self.render(axis + 1, offset + k * stride, cells, line_width, out),
                    None => out.push_str("..."),
                }
            }
        }
        out.push(']');
    }
}

fn format_cells(data: &[Scalar], shown: &[usize], precision: usize) -> Vec<Option<String>> {
    let mut cells = vec![None; data.len()];
    let floats: Vec<f64> = shown
        .iter()
        .filter_map(|&i| match data[i] {
            Scalar::Float(v) => Some(v),
            _ => None,
        })
        .collect();

    if floats.len() == shown.len() {
        let texts = FloatColumn::new(&floats, precision).format_all(&floats);
        for (&i, text) in shown.iter().zip(texts) {
            cells[i] = Some(text);
        }
        return cells;
    }

    let raw: Vec<String> = shown
        .iter()
        .map(|&i| match &data[i] {
            Scalar::Str(s) => quote(s),
            other => other.to_string(),
        })
        .collect();
    let pad = !matches!(data[shown[0]], Scalar::Str(_) | Scalar::Bytes(_));
    let width = raw.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    for (&i, text) in shown.iter().zip(raw) {
        cells[i] = Some(if pad { format!("{text:>width$}") } else { text });
    }
    cells
}

/// Shared layout for a column of floats: positional or scientific.
struct FloatColumn {
    precision: usize,
    scientific: bool,
    int_width: usize,
    frac_width: usize,
}

impl FloatColumn {
    fn new(values: &[f64], precision: usize) -> Self {
        let finite: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v != 0.0)
            .map(f64::abs)
            .collect();
        let scientific = match (
            finite.iter().copied().reduce(f64::max),
            finite.iter().copied().reduce(f64::min),
        ) {
            (Some(max), Some(min)) => max >= 1e8 || min < 1e-4 || max / min > 1e3,
            _ => false,
        };

        let mut column = Self {
            precision,
            scientific,
            int_width: 0,
            frac_width: 0,
        };
        for v in values.iter().filter(|v| v.is_finite()) {
            let (int, frac) = column.split(*v);
            column.int_width = column.int_width.max(int.len());
            column.frac_width = column.frac_width.max(frac.len());
        }
        column
    }

    /// Integer part (with sign) and trimmed fraction digits; in scientific
    /// mode the exponent is appended later.
    fn split(&self, v: f64) -> (String, String) {
        let precision = self.precision;
        let text = if self.scientific {
            let s = format!("{v:.precision$e}");
            s.split_once('e').map_or(s.clone(), |(m, _)| m.to_string())
        } else {
            format!("{v:.precision$}")
        };
        match text.split_once('.') {
            Some((int, frac)) => (int.to_string(), frac.trim_end_matches('0').to_string()),
            None => (text, String::new()),
        }
    }

    fn format(&self, v: f64) -> String {
        let total = self.int_width + 1 + self.frac_width;
        if !v.is_finite() {
            let text = float_repr(v);
            return format!("{text:>total$}");
        }
        let (int, frac) = self.split(v);
        let int_width = self.int_width;
        let frac_width = self.frac_width;
        if self.scientific {
            let precision = self.precision;
            let full = format!("{v:.precision$e}");
            let exp = full.split_once('e').map_or("0", |(_, e)| e);
            let exp = fix_exponent(&format!("0e{exp}"));
            let exp = exp.trim_start_matches('0');
            format!("{int:>int_width$}.{frac:0<frac_width$}{exp}")
        } else {
            format!("{int:>int_width$}.{frac:<frac_width$}")
        }
    }

    fn format_all(&self, values: &[f64]) -> Vec<String> {
        values.iter().map(|&v| self.format(v)).collect()
    }
}

/// A value read from an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single element from a scalar dataspace.
    Scalar(Scalar),
    /// Elements from a simple dataspace.
    Array(Array),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Scalar> {
        values.into_iter().map(Scalar::Int).collect()
    }

    fn floats(values: &[f64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Float).collect()
    }

    #[test]
    fn test_scalar_repr() {
        assert_eq!(Scalar::Int(-3).repr(), "-3");
        assert_eq!(Scalar::Float(0.5).repr(), "0.5");
        assert_eq!(Scalar::Float(1e-5).repr(), "1e-05");
        assert_eq!(Scalar::Str("it's".into()).repr(), "\"it's\"");
        assert_eq!(Scalar::Bytes(b"abc".to_vec()).repr(), "b'abc'");
    }

    #[test]
    fn test_scalar_display_is_unquoted() {
        assert_eq!(Scalar::Str("foo".into()).to_string(), "foo");
        assert_eq!(Scalar::Bool(false).to_string(), "False");
    }

    #[test]
    fn test_array_new_validates_length() {
        assert!(Array::new(vec![2, 2], ints(0..3)).is_err());
        assert!(Array::new(vec![2, 2], ints(0..4)).is_ok());
    }

    #[test]
    fn test_int_array_padding() {
        let arr = Array::from_vec(ints([1, 20, 300]));
        assert_eq!(arr.format_with(&ArrayFormat::attribute()), "[  1  20 300]");
    }

    #[test]
    fn test_float_array_zeros() {
        let arr = Array::from_vec(floats(&[0.0, 0.0, 0.0]));
        assert_eq!(arr.format_with(&ArrayFormat::attribute()), "[0. 0. 0.]");
    }

    #[test]
    fn test_float_array_alignment() {
        let arr = Array::from_vec(floats(&[1.5, 2.0, 3.25]));
        assert_eq!(
            arr.format_with(&ArrayFormat::attribute()),
            "[1.5  2.   3.25]"
        );
    }

    #[test]
    fn test_float_precision_limit() {
        let arr = Array::from_vec(floats(&[1.0 / 3.0, 1.0]));
        assert_eq!(
            arr.format_with(&ArrayFormat::attribute()),
            "[0.33333 1.     ]"
        );
    }

    #[test]
    fn test_scientific_floats() {
        let arr = Array::from_vec(floats(&[1.5e-5, 1.0]));
        assert_eq!(
            arr.format_with(&ArrayFormat::attribute()),
            "[1.5e-05 1.0e+00]"
        );
    }

    #[test]
    fn test_summarised_array() {
        let arr = Array::from_vec(ints(0..20));
        assert_eq!(
            arr.format_with(&ArrayFormat::attribute()),
            "[ 0  1  2 ... 17 18 19]"
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let arr = Array::from_vec(ints(0..10));
        assert_eq!(
            arr.format_with(&ArrayFormat::attribute()),
            "[0 1 2 3 4 5 6 7 8 9]"
        );
    }

    #[test]
    fn test_two_dimensional() {
        let arr = Array::new(vec![2, 3], ints(0..6)).unwrap();
        assert_eq!(arr.to_string(), "[[0 1 2]\n [3 4 5]]");
    }

    #[test]
    fn test_three_dimensional_block_separator() {
        let arr = Array::new(vec![2, 1, 2], ints(0..4)).unwrap();
        assert_eq!(arr.to_string(), "[[[0 1]]\n\n [[2 3]]]");
    }

    #[test]
    fn test_summarised_rows() {
        let arr = Array::new(vec![8, 2], ints(0..16)).unwrap();
        let text = arr.format_with(&ArrayFormat::attribute());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "[[ 0  1]");
        assert_eq!(lines[3], " ...");
        assert_eq!(lines[6], " [14 15]]");
    }

    #[test]
    fn test_line_wrapping() {
        let arr = Array::from_vec(ints(100..130));
        let text = arr.format_with(&ArrayFormat::full(20));
        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|l| l.chars().count() <= 20));
        assert!(text.lines().skip(1).all(|l| l.starts_with(' ')));
    }

    #[test]
    fn test_strings_and_bools() {
        let arr = Array::from_vec(vec![Scalar::Str("a".into()), Scalar::Str("bc".into())]);
        assert_eq!(arr.to_string(), "['a' 'bc']");
        let arr = Array::from_vec(vec![Scalar::Bool(true), Scalar::Bool(false)]);
        assert_eq!(arr.to_string(), "[ True False]");
    }

    #[test]
    fn test_zero_dimensional_and_empty() {
        let scalar = Array::new(vec![], vec![Scalar::Float(2.5)]).unwrap();
        assert_eq!(scalar.to_string(), "2.5");
        let empty = Array::new(vec![0], vec![]).unwrap();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn test_reshape() {
        let arr = Array::from_vec(ints(0..6)).reshape(vec![3, 2]).unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert!(Array::from_vec(ints(0..6)).reshape(vec![4]).is_err());
    }

    #[test]
    fn test_zero_for_types() {
        assert_eq!(Scalar::zero_for(&Datatype::uint(8)), Some(Scalar::UInt(0)));
        assert_eq!(
            Scalar::zero_for(&Datatype::float(32)),
            Some(Scalar::Float(0.0))
        );
        assert_eq!(
            Scalar::zero_for(&Datatype::boolean()),
            Some(Scalar::Bool(false))
        );
        assert_eq!(Scalar::zero_for(&Datatype::Other { size: 4 }), None);
    }
}
