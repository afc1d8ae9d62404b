//! Cycle-safe traversal of a container into a [`TreeNode`].

use crate::container::{Container, ObjectKind};
use crate::datatype::fmt_dtype;
use crate::error::{Error, Result};
use crate::format::{fmt_attr, fmt_shape};
use crate::tree::{follow_member, MemberLink, NodeKind, TreeNode, VisitedSet};

/// Order in which group members are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildOrder {
    /// Sorted by name, byte-wise.
    #[default]
    Lexicographic,
    /// As stored in the container.
    Insertion,
}

/// Options fixed for the lifetime of a [`TreeWalker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkOptions {
    /// Show attributes as a nested `<n> attributes:` node instead of a
    /// count suffix.
    pub expand_attrs: bool,
    /// How to order group members.
    pub order: ChildOrder,
}

/// Walks a container and builds display trees.
///
/// Soft and external links are shown with their targets and never followed.
/// An object reached again through another hard link is shown once in full
/// and afterwards as `name\t= <first path>`.
///
/// # Examples
///
/// ```
/// use h5glance::tree::{TreeWalker, VisitedSet, WalkOptions};
/// use h5glance::{Datatype, MemoryContainer};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/group1/data", Datatype::int(16), &[12]).unwrap();
///
/// let walker = TreeWalker::new(&file, WalkOptions::default());
/// let tree = walker
///     .walk("/", "sample.h5", None, &mut VisitedSet::new())
///     .unwrap();
/// assert_eq!(tree.children[0].label, "group1");
/// assert_eq!(tree.children[0].children[0].detail, "\t[int16: 12]");
/// ```
pub struct TreeWalker<'a> {
    container: &'a dyn Container,
    options: WalkOptions,
}

impl<'a> TreeWalker<'a> {
    /// Create a walker over `container`.
    #[must_use]
    pub fn new(container: &'a dyn Container, options: WalkOptions) -> Self {
        Self { container, options }
    }

    /// Build the tree for the object at `path`, shown as `label`.
    ///
    /// `max_depth` limits how many levels of group members are expanded:
    /// `None` is unbounded and `Some(0)` shows the object alone, with a
    /// child count for groups. Problems with individual members are shown
    /// on their own line rather than aborting the walk.
    ///
    /// # Errors
    ///
    /// Returns an error if the object at `path` itself cannot be inspected.
    pub fn walk(
        &self,
        path: &str,
        label: &str,
        max_depth: Option<usize>,
        visited: &mut VisitedSet,
    ) -> Result<TreeNode> {
        let meta = self.container.metadata(path)?;
        let kind = match meta.kind {
            ObjectKind::Group => NodeKind::Group,
            ObjectKind::Dataset => NodeKind::Dataset,
            ObjectKind::Unknown => NodeKind::Plain,
        };

        if let Some(first) = visited.alias_of(self.container, path)? {
            log::debug!("{path} was already shown at {first}");
            return Ok(TreeNode::leaf(label, format!("\t= {first}"), kind));
        }
        visited.record(self.container.identity(path)?, path);

        let mut children = Vec::new();
        let mut detail = match meta.kind {
            ObjectKind::Dataset => {
                let mut detail = format!(
                    "\t[{}: {}]",
                    meta.dtype.as_ref().map_or_else(String::new, fmt_dtype),
                    fmt_shape(meta.shape.as_deref())
                );
                if meta.is_virtual() {
                    detail.push_str(" virtual");
                }
                detail
            }
            ObjectKind::Group if max_depth == Some(0) => {
                let count = self.container.list_children(path)?.len();
                format!("\t({count} children)")
            }
            ObjectKind::Group => String::new(),
            ObjectKind::Unknown => " (unknown object type)".to_string(),
        };

        if self.options.expand_attrs {
            if let Some(attrs) = self.attributes_node(path) {
                children.push(attrs);
            }
        } else if meta.num_attrs > 0 {
            detail.push_str(&format!(" ({} attributes)", meta.num_attrs));
        }

        let remaining = match max_depth {
            None => Some(None),
            Some(0) => None,
            Some(depth) => Some(Some(depth - 1)),
        };
        if let (ObjectKind::Group, Some(remaining)) = (meta.kind, remaining) {
            for name in self.member_names(path)? {
                children.push(self.member_node(path, &name, remaining, visited));
            }
        }

        Ok(TreeNode {
            label: label.to_string(),
            detail,
            kind,
            children,
        })
    }

    fn member_names(&self, group: &str) -> Result<Vec<String>> {
        let mut names = self.container.list_children(group)?;
        if self.options.order == ChildOrder::Lexicographic {
            names.sort();
        }
        Ok(names)
    }

    fn member_node(
        &self,
        group: &str,
        name: &str,
        max_depth: Option<usize>,
        visited: &mut VisitedSet,
    ) -> TreeNode {
        match follow_member(self.container, group, name) {
            Ok(MemberLink::Target(target)) => {
                TreeNode::leaf(name, format!("\t-> {target}"), NodeKind::Link)
            }
            Ok(MemberLink::Object(path)) => self
                .walk(&path, name, max_depth, visited)
                .unwrap_or_else(|e| unreadable(name, &e)),
            Err(e) => unreadable(name, &e),
        }
    }

    fn attributes_node(&self, path: &str) -> Option<TreeNode> {
        let names = match self.container.attribute_names(path) {
            Ok(names) => names,
            Err(e) => {
                log::warn!("cannot list attributes of {path}: {e}");
                return None;
            }
        };
        if names.is_empty() {
            return None;
        }
        let mut node = TreeNode::leaf(format!("{} attributes:", names.len()), "", NodeKind::Plain);
        node.children = names
            .iter()
            .map(|name| {
                let value = fmt_attr(self.container, path, name);
                TreeNode::leaf(format!("{name}: {value}"), "", NodeKind::Plain)
            })
            .collect();
        Some(node)
    }
}

fn unreadable(name: &str, error: &Error) -> TreeNode {
    log::warn!("cannot show {name}: {error}");
    TreeNode::leaf(name, format!("\t(unreadable: {error})"), NodeKind::Plain)
}
