//! Dataset selections and the slice expressions that produce them.
//!
//! A [`SliceExpr`] is the text a user types after `--slice`, such as
//! `0, 100:110` or `::2, -1`. Resolving it against a dataset shape yields a
//! [`Selection`] to hand to [`Container::read_slice`](super::Container::read_slice)
//! and the shape the result should be viewed with, since integer indices drop
//! their dimension.

use std::ops::Range;
use std::str::FromStr;

use crate::container::element_count;
use crate::container::value::Array;
use crate::error::{Error, Result};

/// Which elements of a dataset to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every element.
    All,

    /// A regular strided region.
    ///
    /// For each dimension, `count` blocks of `block` consecutive elements
    /// are taken, the first at `start` and each following `stride` further on.
    Hyperslab {
        /// First element index per dimension.
        start: Vec<u64>,
        /// Distance between block starts per dimension.
        stride: Vec<u64>,
        /// Number of blocks per dimension.
        count: Vec<u64>,
        /// Elements per block per dimension.
        block: Vec<u64>,
    },
}

impl Selection {
    /// A contiguous hyperslab covering one range per dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::Selection;
    ///
    /// let sel = Selection::slice(&[20..30, 40..60]);
    /// assert_eq!(sel.num_elements(&[100, 100]), 200);
    /// ```
    #[must_use]
    pub fn slice(ranges: &[Range<u64>]) -> Self {
        let rank = ranges.len();
        Self::Hyperslab {
            start: ranges.iter().map(|r| r.start).collect(),
            stride: vec![1; rank],
            count: ranges.iter().map(|r| r.end.saturating_sub(r.start)).collect(),
            block: vec![1; rank],
        }
    }

    /// Number of selected elements in a dataspace of `dims`, saturating at
    /// `u64::MAX`.
    #[must_use]
    pub fn num_elements(&self, dims: &[u64]) -> u64 {
        element_count(&self.output_shape(dims)).unwrap_or(u64::MAX)
    }

    /// Shape of the selected region, one entry per dataset dimension.
    #[must_use]
    pub fn output_shape(&self, dims: &[u64]) -> Vec<u64> {
        match self {
            Self::All => dims.to_vec(),
            Self::Hyperslab { count, block, .. } => {
                count.iter().zip(block).map(|(c, b)| c.saturating_mul(*b)).collect()
            }
        }
    }

    /// Check that the selection lies within a dataspace of `dims`, without
    /// enumerating any indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] for a rank mismatch or a hyperslab that
    /// reaches past the end of an axis.
    pub fn check_bounds(&self, dims: &[u64]) -> Result<()> {
        let Self::Hyperslab {
            start,
            stride,
            count,
            block,
        } = self
        else {
            return Ok(());
        };
        if [start.len(), stride.len(), count.len(), block.len()]
            .iter()
            .any(|&n| n != dims.len())
        {
            return Err(Error::selection(format!(
                "selection rank does not match dataset rank {}",
                dims.len()
            )));
        }
        for axis in 0..dims.len() {
            if count[axis] == 0 || block[axis] == 0 {
                continue;
            }
            let last = (count[axis] - 1)
                .checked_mul(stride[axis])
                .and_then(|offset| offset.checked_add(start[axis]))
                .and_then(|first| first.checked_add(block[axis] - 1));
            if last.map_or(true, |last| last >= dims[axis]) {
                return Err(Error::selection(format!(
                    "selection exceeds extent {} of axis {axis}",
                    dims[axis]
                )));
            }
        }
        Ok(())
    }

    /// Element indices selected along each dimension.
    fn axis_indices(&self, dims: &[u64]) -> Result<Vec<Vec<u64>>> {
        self.check_bounds(dims)?;
        match self {
            Self::All => Ok(dims.iter().map(|&d| (0..d).collect()).collect()),
            Self::Hyperslab {
                start,
                stride,
                count,
                block,
            } => Ok((0..dims.len())
                .map(|axis| {
                    (0..count[axis])
                        .flat_map(|c| {
                            let first = start[axis] + c * stride[axis];
                            first..first + block[axis]
                        })
                        .collect()
                })
                .collect()),
        }
    }

    /// Copy the selected elements out of a full array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] if the selection does not fit the array.
    pub fn extract(&self, array: &Array) -> Result<Array> {
        let dims = array.shape();
        let axes = self.axis_indices(dims)?;
        let shape: Vec<u64> = axes.iter().map(|a| a.len() as u64).collect();

        let mut strides = vec![1u64; dims.len()];
        for axis in (0..dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1].saturating_mul(dims[axis + 1]);
        }

        let total = element_count(&shape)
            .ok_or_else(|| Error::selection("selection has too many elements"))?;
        let mut data = Vec::with_capacity(total as usize);
        let mut cursor = vec![0usize; dims.len()];
        for _ in 0..total {
            let flat: u64 = cursor
                .iter()
                .enumerate()
                .map(|(axis, &i)| axes[axis][i] * strides[axis])
                .sum();
            data.push(array.data()[flat as usize].clone());

            for axis in (0..cursor.len()).rev() {
                cursor[axis] += 1;
                if cursor[axis] < axes[axis].len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
        Array::new(shape, data)
    }
}

/// One comma-separated item of a slice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceItem {
    /// A single position; negative values count from the end.
    Index(i64),
    /// A `start:stop:step` range, each part optional.
    Range {
        /// First position.
        start: Option<i64>,
        /// Position after the last.
        stop: Option<i64>,
        /// Step between positions.
        step: Option<i64>,
    },
    /// `...`, standing for as many full ranges as needed.
    Ellipsis,
}

/// A parsed slice expression.
///
/// # Examples
///
/// ```
/// use h5glance::SliceExpr;
///
/// let expr: SliceExpr = "0, 100:110".parse().unwrap();
/// let resolved = expr.resolve(&[2, 128, 500]).unwrap();
/// assert_eq!(resolved.shape, vec![10, 500]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceExpr {
    items: Vec<SliceItem>,
}

/// A selection together with the shape its result is viewed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    /// What to read.
    pub selection: Selection,
    /// Result shape, without dimensions consumed by integer indices.
    pub shape: Vec<u64>,
}

impl SliceExpr {
    /// Parse a slice expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] for anything that is not a
    /// comma-separated list of integers, ranges and at most one `...`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(trimmed);

        let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.last() == Some(&"") {
            parts.pop();
        }

        let mut items = Vec::with_capacity(parts.len());
        for part in parts {
            items.push(Self::parse_item(part, text)?);
        }
        if items.iter().filter(|i| **i == SliceItem::Ellipsis).count() > 1 {
            return Err(Error::selection(
                "an index can only have a single ellipsis ('...')",
            ));
        }
        Ok(Self { items })
    }

    fn parse_item(part: &str, whole: &str) -> Result<SliceItem> {
        let invalid = || Error::selection(format!("invalid slice expression: {whole}"));
        let number = |s: &str| -> Result<Option<i64>> {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse().map(Some).map_err(|_| invalid())
            }
        };

        if part == "..." {
            return Ok(SliceItem::Ellipsis);
        }
        if part.is_empty() {
            return Err(invalid());
        }
        if !part.contains(':') {
            return number(part)?.map(SliceItem::Index).ok_or_else(invalid);
        }

        let pieces: Vec<&str> = part.split(':').collect();
        if pieces.len() > 3 {
            return Err(invalid());
        }
        Ok(SliceItem::Range {
            start: number(pieces[0])?,
            stop: number(pieces[1])?,
            step: match pieces.get(2) {
                Some(p) => number(p)?,
                None => None,
            },
        })
    }

    /// The parsed items.
    #[must_use]
    pub fn items(&self) -> &[SliceItem] {
        &self.items
    }

    /// Resolve against a dataset shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] for too many indices, out-of-range
    /// integer indices, and zero or negative steps.
    pub fn resolve(&self, dims: &[u64]) -> Result<ResolvedSelection> {
        let explicit = self
            .items
            .iter()
            .filter(|i| **i != SliceItem::Ellipsis)
            .count();
        if explicit > dims.len() {
            return Err(Error::selection(format!(
                "too many indices for dataset: dataset is {}-dimensional, but {explicit} were indexed",
                dims.len()
            )));
        }

        let full = SliceItem::Range {
            start: None,
            stop: None,
            step: None,
        };
        let mut expanded = Vec::with_capacity(dims.len());
        for item in &self.items {
            if *item == SliceItem::Ellipsis {
                expanded.extend(std::iter::repeat(full).take(dims.len() - explicit));
            } else {
                expanded.push(*item);
            }
        }
        expanded.resize(dims.len(), full);

        let rank = dims.len();
        let mut start = Vec::with_capacity(rank);
        let mut stride = Vec::with_capacity(rank);
        let mut count = Vec::with_capacity(rank);
        let mut shape = Vec::with_capacity(rank);

        for (axis, (item, &dim)) in expanded.iter().zip(dims).enumerate() {
            let size = i64::try_from(dim)
                .map_err(|_| Error::selection(format!("axis {axis} is too large to slice")))?;
            match *item {
                SliceItem::Index(i) => {
                    let pos = if i < 0 { i + size } else { i };
                    if !(0..size).contains(&pos) {
                        return Err(Error::selection(format!(
                            "index {i} is out of bounds for axis {axis} with size {dim}"
                        )));
                    }
                    start.push(pos as u64);
                    stride.push(1);
                    count.push(1);
                }
                SliceItem::Range {
                    start: lo,
                    stop: hi,
                    step,
                } => {
                    let step = step.unwrap_or(1);
                    if step == 0 {
                        return Err(Error::selection("slice step cannot be zero"));
                    }
                    if step < 0 {
                        return Err(Error::selection(format!(
                            "Step must be >= 1 (got {step})"
                        )));
                    }
                    let clamp = |v: i64| {
                        let v = if v < 0 { v + size } else { v };
                        v.clamp(0, size)
                    };
                    let lo = lo.map_or(0, clamp);
                    let hi = hi.map_or(size, clamp);
                    let n = if hi > lo { (hi - lo - 1) / step + 1 } else { 0 };
                    start.push(if n > 0 { lo as u64 } else { 0 });
                    stride.push(step as u64);
                    count.push(n as u64);
                    shape.push(n as u64);
                }
                SliceItem::Ellipsis => {}
            }
        }

        Ok(ResolvedSelection {
            selection: Selection::Hyperslab {
                start,
                stride,
                count,
                block: vec![1; rank],
            },
            shape,
        })
    }
}

impl FromStr for SliceExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
