//! One-line summaries of shapes and attribute values.

use crate::container::value::ArrayFormat;
use crate::container::{Container, Value, UNLIMITED};
use crate::datatype::fmt_dtype;

/// Longest scalar repr shown in full; longer ones keep both ends.
const MAX_SCALAR_WIDTH: usize = 50;
const SCALAR_EDGE: usize = 20;

/// Describe a dataspace shape.
///
/// `None` is an empty (null) dataspace and an empty slice a scalar.
///
/// # Examples
///
/// ```
/// use h5glance::fmt_shape;
///
/// assert_eq!(fmt_shape(None), "empty");
/// assert_eq!(fmt_shape(Some(&[])), "scalar");
/// assert_eq!(fmt_shape(Some(&[2, 128, 500])), "2 × 128 × 500");
/// assert_eq!(fmt_shape(Some(&[u64::MAX, 3])), "Unlimited × 3");
/// ```
#[must_use]
pub fn fmt_shape(shape: Option<&[u64]>) -> String {
    match shape {
        None => "empty".to_string(),
        Some([]) => "scalar".to_string(),
        Some(dims) => dims
            .iter()
            .map(|&d| {
                if d == UNLIMITED {
                    "Unlimited".to_string()
                } else {
                    d.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" × "),
    }
}

/// Format an attribute to show on a single line.
///
/// Small attributes (scalars and 1-D arrays) are read and shown inline;
/// anything bigger, empty or unreadable gets a bracketed type summary.
///
/// # Examples
///
/// ```
/// use h5glance::{fmt_attr, MemoryContainer};
///
/// let mut file = MemoryContainer::new("demo.h5");
/// file.set_attr_str("/", "title", "foo").unwrap();
/// assert_eq!(fmt_attr(&file, "/", "title"), "'foo'");
/// ```
#[must_use]
pub fn fmt_attr(container: &dyn Container, path: &str, name: &str) -> String {
    let info = match container.attribute_info(path, name) {
        Ok(info) => info,
        Err(e) => {
            log::warn!("cannot inspect attribute {name} of {path}: {e}");
            return "unreadable".to_string();
        }
    };
    let dtype = fmt_dtype(&info.dtype);

    let Some(shape) = info.shape else {
        return format!("empty [{dtype}]");
    };

    if shape.len() > 1 {
        return format!("array [{dtype}: {}]", fmt_shape(Some(shape.as_slice())));
    }

    match container.read_attribute(path, name) {
        Ok(Value::Array(array)) => array.format_with(&ArrayFormat::attribute()),
        Ok(Value::Scalar(scalar)) => truncate_middle(&scalar.repr()),
        Err(e) => {
            log::debug!("attribute {name} of {path} is unreadable: {e}");
            format!("unreadable [{dtype}: {}]", fmt_shape(Some(shape.as_slice())))
        }
    }
}

fn truncate_middle(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_SCALAR_WIDTH {
        return text.to_string();
    }
    let head: String = chars[..SCALAR_EDGE].iter().collect();
    let tail: String = chars[chars.len() - SCALAR_EDGE..].iter().collect();
    format!("{head}...{tail}")
}
