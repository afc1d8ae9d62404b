//! Detail view of a single object, as shown by the `h5glance` command.

use std::io::{self, IsTerminal, Write};

use terminal_size::{terminal_size, Width};

use crate::container::value::ArrayFormat;
use crate::container::{normalize_path, Array, Container, Layout, ObjectKind, Selection, SliceExpr};
use crate::datatype::fmt_dtype;
use crate::error::{Error, Result};
use crate::format::{fmt_attr, fmt_shape};
use crate::output::TextTreeRenderer;
use crate::tree::{TreeWalker, VisitedSet, WalkOptions};

/// Line width for data listings when stdout is not a terminal.
const DEFAULT_LINE_WIDTH: usize = 75;

/// Rows and columns shown in the sample of a multi-dimensional dataset.
const SAMPLE_EDGE: u64 = 10;

fn line_width() -> usize {
    if !io::stdout().is_terminal() {
        return DEFAULT_LINE_WIDTH;
    }
    terminal_size().map_or(DEFAULT_LINE_WIDTH, |(Width(w), _)| usize::from(w))
}

/// Print the details of a dataset: type, shape, storage and some data.
///
/// With `slice`, the selected part is printed instead of the default
/// sample. Problems reading or slicing data are reported in the output.
///
/// # Errors
///
/// Returns an error if `path` is not a dataset or writing fails.
pub fn print_dataset_info(
    container: &dyn Container,
    path: &str,
    slice: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let meta = container.metadata(path)?;
    if meta.kind != ObjectKind::Dataset {
        return Err(Error::UnsupportedInputKind {
            description: format!("{path} is not a dataset"),
        });
    }
    let dtype = meta.dtype.as_ref().map_or_else(String::new, fmt_dtype);
    let shape = meta.shape.as_deref();

    writeln!(out, "      dtype: {dtype}")?;
    writeln!(out, "      shape: {}", fmt_shape(shape))?;
    if shape.is_some_and(|dims| !dims.is_empty()) {
        writeln!(out, "   maxshape: {}", fmt_shape(meta.maxshape.as_deref()))?;
    }
    let layout = meta.layout.unwrap_or(Layout::Unknown);
    writeln!(out, "     layout: {layout}")?;
    if layout == Layout::Chunked {
        writeln!(out, "      chunk: {}", fmt_shape(meta.chunks.as_deref()))?;
        let (name, options) = meta.compression.as_ref().map_or(("None", "None"), |c| {
            (c.name.as_str(), c.options.as_deref().unwrap_or("None"))
        });
        writeln!(out, "compression: {name} (options: {options})")?;
    }

    let format = ArrayFormat::full(line_width());
    if let Some(expr) = slice {
        writeln!(out, "\nselected data [{expr}]:")?;
        match read_selection(container, path, shape, expr) {
            Ok(array) => writeln!(out, "{}", array.format_with(&format))?,
            Err(e) => writeln!(out, "Error slicing: {e}")?,
        }
    } else if meta.size() > 0 {
        writeln!(out, "\nsample data:")?;
        match read_sample(container, path, shape.unwrap_or_default()) {
            Ok(array) => writeln!(out, "{}", array.format_with(&format))?,
            Err(e) => writeln!(out, "unreadable: {e}")?,
        }
    }

    let names = container.attribute_names(path)?;
    writeln!(out, "\n{} attributes:", names.len())?;
    for name in &names {
        writeln!(out, "* {name}: {}", fmt_attr(container, path, name))?;
    }
    Ok(())
}

fn read_selection(
    container: &dyn Container,
    path: &str,
    shape: Option<&[u64]>,
    expr: &str,
) -> Result<Array> {
    let dims = shape.ok_or_else(|| Error::selection("empty datasets cannot be sliced"))?;
    let resolved = SliceExpr::parse(expr)?.resolve(dims)?;
    container
        .read_slice(path, &resolved.selection)?
        .reshape(resolved.shape)
}

/// The first few values: up to ten of a vector, or the top-left corner of
/// the first matrix of a higher-dimensional dataset.
fn read_sample(container: &dyn Container, path: &str, dims: &[u64]) -> Result<Array> {
    match dims {
        [] => container.read_slice(path, &Selection::All),
        [len] => container.read_slice(path, &Selection::slice(&[0..(*len).min(SAMPLE_EDGE)])),
        [leading @ .., rows, cols] => {
            let mut ranges = vec![0..1; leading.len()];
            ranges.push(0..(*rows).min(SAMPLE_EDGE));
            ranges.push(0..(*cols).min(SAMPLE_EDGE));
            let shape = vec![ranges[leading.len()].end, ranges[leading.len() + 1].end];
            container
                .read_slice(path, &Selection::slice(&ranges))?
                .reshape(shape)
        }
    }
}

/// Show a file, group or dataset.
///
/// Groups (and the whole file when `path` is `None`) are shown as a tree
/// rooted at `<filename>` or `<filename>/<path>`; datasets as that label
/// followed by [`print_dataset_info`].
///
/// # Errors
///
/// - [`Error::NotFound`] if nothing exists at `path`
/// - [`Error::Selection`] if `slice` is given for a group
/// - [`Error::UnsupportedInputKind`] for objects that are neither
/// - [`Error::Io`] if writing fails
///
/// # Examples
///
/// ```
/// use h5glance::output::{display_object, TextTreeRenderer};
/// use h5glance::{Datatype, MemoryContainer};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/group1/data", Datatype::int(16), &[12]).unwrap();
///
/// let mut out = Vec::new();
/// display_object(&file, None, false, None, &TextTreeRenderer::plain(), &mut out).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert_eq!(text, "sample.h5\n└group1\n  └data\t[int16: 12]\n");
/// ```
pub fn display_object(
    container: &dyn Container,
    path: Option<&str>,
    expand_attrs: bool,
    slice: Option<&str>,
    renderer: &TextTreeRenderer,
    out: &mut dyn Write,
) -> Result<()> {
    let (in_file, label) = match path.filter(|p| !p.is_empty()) {
        Some(p) => (
            normalize_path(p),
            format!("{}/{}", container.filename(), p.trim_start_matches('/')),
        ),
        None => ("/".to_string(), container.filename().to_string()),
    };

    let meta = container.metadata(&in_file)?;
    match meta.kind {
        ObjectKind::Group => {
            if slice.is_some() {
                return Err(Error::selection("Slicing is only allowed for datasets"));
            }
            let walker = TreeWalker::new(
                container,
                WalkOptions {
                    expand_attrs,
                    ..WalkOptions::default()
                },
            );
            let tree = walker.walk(&in_file, &label, None, &mut VisitedSet::new())?;
            renderer.print_tree(&tree, out)?;
        }
        ObjectKind::Dataset => {
            writeln!(out, "{label}")?;
            print_dataset_info(container, &in_file, slice, out)?;
        }
        ObjectKind::Unknown => {
            return Err(Error::UnsupportedInputKind {
                description: format!("{label} is neither a group nor a dataset"),
            });
        }
    }
    Ok(())
}
