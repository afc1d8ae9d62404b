//! Collapsible HTML views of a container.
//!
//! The view is a nested list styled by a small stylesheet: every group is a
//! checkbox and label that show or hide its members, so no script is needed
//! to browse. A second script adds "copy path" links next to datasets.
//!
//! Element ids come from an [`IdSequence`] owned by the renderer, so several
//! trees rendered by one [`HtmlTreeRenderer`] can share a page.

use std::fmt::Write as _;
use std::path::Path;

use crate::container::{self, normalize_path, Container, ObjectKind};
use crate::datatype::Datatype;
use crate::error::{Error, Result};
use crate::format::fmt_shape;
use crate::tree::{follow_member, MemberLink, VisitedSet};

const TREEVIEW_CSS: &str = include_str!("assets/treeview.css");
const COPYPATH_JS: &str = include_str!("assets/copypath.js");
const ACTIVATE_MARKER: &str = "/*ACTIVATE*/";

/// A counter handing out unique numbers for element ids.
#[derive(Debug, Default, Clone)]
pub struct IdSequence {
    next: usize,
}

impl IdSequence {
    /// A sequence starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The next unused number.
    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Escape text for use in HTML content and attribute values.
///
/// # Examples
///
/// ```
/// use h5glance::html::escape;
///
/// assert_eq!(escape("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
/// ```
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The numpy-style type code in `<code>`, wrapped in an `<abbr>` explaining
/// it when the kind is a familiar one.
///
/// # Examples
///
/// ```
/// use h5glance::html::dtype_abbr;
/// use h5glance::Datatype;
///
/// assert_eq!(
///     dtype_abbr(&Datatype::float(32)),
///     "<abbr title=\"32-bit floating point\"><code>&lt;f4</code></abbr>"
/// );
/// ```
#[must_use]
pub fn dtype_abbr(dtype: &Datatype) -> String {
    let code = dtype.type_code();
    let bits = dtype.size() * 8;
    let title = match code.chars().nth(1) {
        Some('u') => Some(format!("{bits}-bit unsigned integer")),
        Some('i') => Some(format!("{bits}-bit signed integer")),
        Some('f') => Some(format!("{bits}-bit floating point")),
        Some('c') => Some(format!("{bits}-bit complex floating point")),
        Some('b') => Some("boolean".to_string()),
        Some('O') => Some("object (e.g. string)".to_string()),
        _ => None,
    };
    let code = format!("<code>{}</code>", escape(&code));
    match title {
        Some(title) => format!("<abbr title=\"{}\">{code}</abbr>", escape(&title)),
        None => code,
    }
}

/// Renders containers as collapsible HTML trees.
///
/// # Examples
///
/// ```
/// use h5glance::html::HtmlTreeRenderer;
/// use h5glance::{Datatype, MemoryContainer};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/group1/data", Datatype::int(16), &[12]).unwrap();
///
/// let mut renderer = HtmlTreeRenderer::new();
/// let html = renderer.render_fragment(&file, "/").unwrap();
/// assert!(html.contains("id=\"h5glance-tree-0\""));
/// assert!(html.contains("<label for=\"h5glance-tree-0-item-1\">group1</label>"));
/// ```
#[derive(Debug, Clone)]
pub struct HtmlTreeRenderer {
    trees: IdSequence,
    copy_links: bool,
}

impl Default for HtmlTreeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTreeRenderer {
    /// A renderer that adds copy-path links to datasets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: IdSequence::new(),
            copy_links: true,
        }
    }

    /// Turn copy-path links on or off.
    #[must_use]
    pub fn with_copy_links(mut self, copy_links: bool) -> Self {
        self.copy_links = copy_links;
        self
    }

    /// An embeddable `<div>` with the stylesheet, the tree and its script.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedInputKind`] if `path` is not a group, or
    /// any error inspecting it.
    pub fn render_fragment(&mut self, container: &dyn Container, path: &str) -> Result<String> {
        let (id, tree) = self.tree(container, path)?;
        let script = activate(&format!(
            "enableCopyLinks(document.getElementById(\"{id}\"));"
        ));
        Ok(format!(
            "<div><style>\n{TREEVIEW_CSS}</style>\n{tree}\n<script>\n{script}</script>\n</div>"
        ))
    }

    /// A complete HTML page showing the tree.
    ///
    /// # Errors
    ///
    /// See [`HtmlTreeRenderer::render_fragment`].
    pub fn render_document(&mut self, container: &dyn Container, path: &str) -> Result<String> {
        let (id, tree) = self.tree(container, path)?;
        let script = activate(&format!(
            "document.addEventListener(\"DOMContentLoaded\", function () {{\n        \
             enableCopyLinks(document.getElementById(\"{id}\"));\n    }});"
        ));
        let title = escape(container.filename());
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <style>\n{TREEVIEW_CSS}</style>\n<script>\n{script}</script>\n</head>\n\
             <body>\n{tree}\n</body>\n</html>\n"
        ))
    }

    /// Open a container file and render it as a complete page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedInputKind`] if the file is not a
    /// recognised container, and any error from opening it.
    pub fn render_file(&mut self, file: &Path) -> Result<String> {
        let container = container::open(file)?;
        self.render_document(container.as_ref(), "/")
    }

    fn tree(&mut self, container: &dyn Container, path: &str) -> Result<(String, String)> {
        let path = normalize_path(path);
        let meta = container.metadata(&path)?;
        if meta.kind != ObjectKind::Group {
            return Err(Error::UnsupportedInputKind {
                description: format!("{path} is not a group"),
            });
        }

        let id = format!("h5glance-tree-{}", self.trees.next_id());
        let label = if path == "/" {
            container.filename().to_string()
        } else {
            path.clone()
        };

        let mut builder = TreeBuilder {
            container,
            tree_id: &id,
            items: IdSequence::new(),
            visited: VisitedSet::new(),
            copy_links: self.copy_links,
            html: String::new(),
        };
        let _ = write!(
            builder.html,
            "<div class=\"h5glance-css-treeview\" id=\"{id}\"><ul>"
        );
        builder.group_item(&path, &label, true)?;
        builder.html.push_str("</ul></div>");
        let html = builder.html;
        Ok((id, html))
    }
}

fn activate(code: &str) -> String {
    COPYPATH_JS.replace(ACTIVATE_MARKER, code)
}

/// A member of a group, classified before anything is written.
enum Member {
    Group { name: String, path: String },
    Dataset { name: String, path: String },
    Leaf(String),
}

struct TreeBuilder<'a> {
    container: &'a dyn Container,
    tree_id: &'a str,
    items: IdSequence,
    visited: VisitedSet,
    copy_links: bool,
    html: String,
}

impl TreeBuilder<'_> {
    fn group_item(&mut self, path: &str, label: &str, checked: bool) -> Result<()> {
        let id = self.container.identity(path)?;
        self.visited.record(id, path);

        let item = format!("{}-item-{}", self.tree_id, self.items.next_id());
        let checked = if checked { " checked" } else { "" };
        let _ = write!(
            self.html,
            "<li><input type=\"checkbox\" id=\"{item}\"{checked}><label for=\"{item}\">{}</label><ul>",
            escape(label)
        );

        let mut names = self.container.list_children(path)?;
        names.sort();
        let members: Vec<Member> = names.into_iter().map(|n| self.classify(path, n)).collect();

        let (groups, others): (Vec<_>, Vec<_>) = members
            .into_iter()
            .partition(|m| matches!(m, Member::Group { .. }));
        for member in groups.into_iter().chain(others) {
            match member {
                Member::Group { name, path } => self.subgroup_item(&name, &path),
                Member::Dataset { name, path } => self.dataset_item(&name, &path),
                Member::Leaf(html) => self.html.push_str(&html),
            }
        }

        self.html.push_str("</ul></li>");
        Ok(())
    }

    fn subgroup_item(&mut self, name: &str, path: &str) {
        if let Some(first) = self.already_shown(path) {
            self.leaf(name, "h5glance-dataset", &format!(" = {}", escape(&first)));
            return;
        }
        if let Err(e) = self.group_item(path, name, false) {
            log::warn!("cannot show group {path}: {e}");
            self.leaf(name, "h5glance-dataset", ": unreadable");
        }
    }

    fn already_shown(&self, path: &str) -> Option<String> {
        self.visited.alias_of(self.container, path).ok().flatten()
    }

    /// Sort a member into subgroup, dataset or finished leaf. Objects shown
    /// at an earlier level become alias leaves here; ones first met at this
    /// level are checked again when their item is written.
    fn classify(&self, group: &str, name: String) -> Member {
        match follow_member(self.container, group, &name) {
            Ok(MemberLink::Target(target)) => Member::Leaf(leaf_html(
                &name,
                "h5glance-dataset h5glance-link",
                &format!(" -&gt; {}", escape(&target)),
            )),
            Ok(MemberLink::Object(path)) => self.classify_object(name, path),
            Err(e) => {
                log::warn!("cannot classify {name} in {group}: {e}");
                Member::Leaf(leaf_html(&name, "h5glance-dataset", ": unreadable"))
            }
        }
    }

    fn classify_object(&self, name: String, path: String) -> Member {
        if let Some(first) = self.already_shown(&path) {
            return Member::Leaf(leaf_html(
                &name,
                "h5glance-dataset",
                &format!(" = {}", escape(&first)),
            ));
        }
        match self.container.metadata(&path).map(|m| m.kind) {
            Ok(ObjectKind::Group) => Member::Group { name, path },
            Ok(ObjectKind::Dataset) => Member::Dataset { name, path },
            Ok(ObjectKind::Unknown) => {
                Member::Leaf(leaf_html(&name, "h5glance-dataset", ": unknown object type"))
            }
            Err(e) => {
                log::warn!("cannot inspect {path}: {e}");
                Member::Leaf(leaf_html(&name, "h5glance-dataset", ": unreadable"))
            }
        }
    }

    fn dataset_item(&mut self, name: &str, path: &str) {
        if let Some(first) = self.already_shown(path) {
            self.leaf(name, "h5glance-dataset", &format!(" = {}", escape(&first)));
            return;
        }
        if let Ok(id) = self.container.identity(path) {
            self.visited.record(id, path);
        }

        let meta = match self.container.metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("cannot inspect {path}: {e}");
                self.leaf(name, "h5glance-dataset", ": unreadable");
                return;
            }
        };

        let copy = if self.copy_links {
            format!(
                " <a class=\"h5glance-dataset-copylink\" href=\"#\" data-hdf5-path=\"{}\" title=\"Copy path\">[copy path]</a>",
                escape(path)
            )
        } else {
            String::new()
        };
        let dtype = meta.dtype.as_ref().map_or_else(String::new, dtype_abbr);
        let _ = write!(
            self.html,
            "<li class=\"h5glance-dataset\"><span class=\"h5glance-dataset-name\">{}</span>{copy}: {} entries, dtype: {dtype}</li>",
            escape(name),
            fmt_shape(meta.shape.as_deref())
        );
    }

    fn leaf(&mut self, name: &str, class: &str, detail: &str) {
        self.html.push_str(&leaf_html(name, class, detail));
    }
}

fn leaf_html(name: &str, class: &str, detail: &str) -> String {
    format!(
        "<li class=\"{class}\"><span class=\"h5glance-dataset-name\">{}</span>{detail}</li>",
        escape(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    fn sample() -> MemoryContainer {
        let mut file = MemoryContainer::new("sample.h5");
        file.create_dataset("/b_data", Datatype::float(32), &[3, 4])
            .unwrap();
        file.create_dataset("/a_group/x", Datatype::uint(8), &[5])
            .unwrap();
        file.create_group("/z_group").unwrap();
        file
    }

    #[test]
    fn test_id_sequence() {
        let mut ids = IdSequence::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
    }

    #[test]
    fn test_dtype_abbr_kinds() {
        assert_eq!(
            dtype_abbr(&Datatype::boolean()),
            "<abbr title=\"boolean\"><code>|b1</code></abbr>"
        );
        assert_eq!(
            dtype_abbr(&Datatype::uint(64)),
            "<abbr title=\"64-bit unsigned integer\"><code>&lt;u8</code></abbr>"
        );
        assert_eq!(
            dtype_abbr(&Datatype::vlen_str(crate::datatype::CharacterSet::Utf8)),
            "<abbr title=\"object (e.g. string)\"><code>|O</code></abbr>"
        );
        assert_eq!(
            dtype_abbr(&Datatype::fixed_str(5, crate::datatype::CharacterSet::Ascii)),
            "<code>|S5</code>"
        );
    }

    #[test]
    fn test_groups_before_datasets() {
        let html = HtmlTreeRenderer::new()
            .render_fragment(&sample(), "/")
            .unwrap();
        let a = html.find(">a_group</label>").unwrap();
        let z = html.find(">z_group</label>").unwrap();
        let b = html.find(">b_data</span>").unwrap();
        assert!(a < z && z < b);
        assert!(html.contains(": 3 × 4 entries, dtype: <abbr title=\"32-bit floating point\">"));
        assert!(html.contains("data-hdf5-path=\"/b_data\""));
    }

    #[test]
    fn test_only_first_checkbox_checked() {
        let html = HtmlTreeRenderer::new()
            .render_fragment(&sample(), "/")
            .unwrap();
        assert_eq!(html.matches(" checked>").count(), 1);
        assert!(html.contains("id=\"h5glance-tree-0-item-0\" checked><label for=\"h5glance-tree-0-item-0\">sample.h5</label>"));
        assert_eq!(html.matches("<input type=\"checkbox\"").count(), 3);
    }

    #[test]
    fn test_fragment_and_document() {
        let mut renderer = HtmlTreeRenderer::new();
        let fragment = renderer.render_fragment(&sample(), "/").unwrap();
        assert!(fragment.starts_with("<div><style>"));
        assert!(!fragment.contains("<!DOCTYPE"));
        assert!(fragment.contains("enableCopyLinks(document.getElementById(\"h5glance-tree-0\"));"));
        assert!(!fragment.contains(ACTIVATE_MARKER));

        let document = renderer.render_document(&sample(), "/").unwrap();
        assert!(document.starts_with("<!DOCTYPE html>"));
        assert!(document.contains("<title>sample.h5</title>"));
        assert!(document.contains("id=\"h5glance-tree-1\""));
        assert!(document.contains("h5glance-tree-1-item-0"));
    }

    #[test]
    fn test_links_and_aliases() {
        let mut file = sample();
        file.link_hard("/y_alias", "/a_group/x").unwrap();
        file.link_hard("/c_group_alias", "/a_group").unwrap();
        file.link_soft("/soft", "/b_data").unwrap();
        file.link_external("/ext", "other.h5", "/data").unwrap();

        let html = HtmlTreeRenderer::new()
            .with_copy_links(false)
            .render_fragment(&file, "/")
            .unwrap();
        assert!(html.contains("<span class=\"h5glance-dataset-name\">y_alias</span> = /a_group/x</li>"));
        assert!(html.contains("<span class=\"h5glance-dataset-name\">c_group_alias</span> = /a_group</li>"));
        assert!(html.contains("<span class=\"h5glance-dataset-name\">soft</span> -&gt; /b_data</li>"));
        assert!(html.contains("<span class=\"h5glance-dataset-name\">ext</span> -&gt; other.h5//data</li>"));
        assert!(!html.contains("h5glance-dataset-copylink\" href"));
    }

    #[test]
    fn test_names_are_escaped() {
        let mut file = MemoryContainer::new("a&b.h5");
        file.create_dataset("/<x>", Datatype::int(8), &[1]).unwrap();
        let html = HtmlTreeRenderer::new().render_document(&file, "/").unwrap();
        assert!(html.contains("<title>a&amp;b.h5</title>"));
        assert!(html.contains(">&lt;x&gt;</span>"));
        assert!(!html.contains("<x>"));
    }

    #[test]
    fn test_dataset_is_rejected() {
        let err = HtmlTreeRenderer::new()
            .render_fragment(&sample(), "/b_data")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedInputKind { .. }));
    }

    #[test]
    fn test_subgroup_label_is_path() {
        let html = HtmlTreeRenderer::new()
            .render_fragment(&sample(), "a_group")
            .unwrap();
        assert!(html.contains(">/a_group</label>"));
        assert!(html.contains(">x</span>"));
    }
}
