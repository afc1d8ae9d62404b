//! Display trees built from a container.
//!
//! A [`TreeNode`] is the renderer-neutral result of walking a container: a
//! label, a detail string and nested children. Trees are owned values with no
//! back-references; objects reached a second time through a hard link become
//! alias leaves instead of cycles.

pub mod walker;

use std::collections::HashMap;

use crate::container::{join_path, Container, LinkKind, ObjectId};
use crate::error::Result;

pub use walker::{ChildOrder, TreeWalker, WalkOptions};

/// What a node stands for, used only to pick a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A group.
    Group,
    /// A dataset.
    Dataset,
    /// A soft or external link.
    Link,
    /// Anything else: attribute lines, unknown objects.
    Plain,
}

/// One line of a display tree and everything nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Object name, or the root label.
    pub label: String,
    /// Text following the label, usually starting with a tab.
    pub detail: String,
    /// Kind of object the label names.
    pub kind: NodeKind,
    /// Nested nodes in display order.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no children.
    #[must_use]
    pub fn leaf(label: impl Into<String>, detail: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Number of lines the node renders to, including its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::tree::{NodeKind, TreeNode};
    ///
    /// let mut root = TreeNode::leaf("root", "", NodeKind::Group);
    /// root.children.push(TreeNode::leaf("a", "", NodeKind::Dataset));
    /// root.children.push(TreeNode::leaf("b", "", NodeKind::Dataset));
    /// assert_eq!(root.line_count(), 3);
    /// ```
    #[must_use]
    pub fn line_count(&self) -> usize {
        1 + self.children.iter().map(Self::line_count).sum::<usize>()
    }
}

/// Objects already expanded during one render, with the path each was
/// first shown at.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    first_paths: HashMap<ObjectId, String>,
}

impl VisitedSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path the object was first shown at, if it has been seen.
    #[must_use]
    pub fn first_path(&self, id: ObjectId) -> Option<&str> {
        self.first_paths.get(&id).map(String::as_str)
    }

    /// Remember `path` as the first appearance of `id`.
    ///
    /// Returns `false` if the object was already recorded, leaving the
    /// earlier path in place.
    pub fn record(&mut self, id: ObjectId, path: &str) -> bool {
        if self.first_paths.contains_key(&id) {
            return false;
        }
        self.first_paths.insert(id, path.to_string());
        true
    }

    /// Path the object at `path` in `container` was first shown at, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the object's identity cannot be read.
    pub fn alias_of(&self, container: &dyn Container, path: &str) -> Result<Option<String>> {
        let id = container.identity(path)?;
        Ok(self.first_path(id).map(str::to_string))
    }

    /// Number of objects recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.first_paths.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_paths.is_empty()
    }
}

/// Where a group member leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberLink {
    /// A soft or external link, shown by its target and never followed.
    Target(String),
    /// A hard link to the object at this path.
    Object(String),
}

/// Classify member `name` of `group`.
///
/// External targets are written `file/path`.
///
/// # Errors
///
/// Returns an error if the link cannot be read.
pub fn follow_member(container: &dyn Container, group: &str, name: &str) -> Result<MemberLink> {
    Ok(match container.link_kind(group, name)? {
        LinkKind::Soft { target } => MemberLink::Target(target),
        LinkKind::External { file, path } => MemberLink::Target(format!("{file}/{path}")),
        LinkKind::Hard => MemberLink::Object(join_path(group, name)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    #[test]
    fn test_visited_keeps_first_path() {
        let mut visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.record(ObjectId(7), "/group1/subgroup1"));
        assert!(!visited.record(ObjectId(7), "/synonyms/folder"));
        assert_eq!(visited.first_path(ObjectId(7)), Some("/group1/subgroup1"));
        assert_eq!(visited.first_path(ObjectId(8)), None);
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_follow_member_and_alias() {
        let mut file = MemoryContainer::new("sample.h5");
        file.create_group("/group1/subgroup1").unwrap();
        file.link_hard("/group1/again", "/group1/subgroup1").unwrap();
        file.link_soft("/group1/soft", "/group1/subgroup1").unwrap();
        file.link_external("/group1/ext", "other.h5", "/data").unwrap();

        assert_eq!(
            follow_member(&file, "/group1", "subgroup1").unwrap(),
            MemberLink::Object("/group1/subgroup1".to_string())
        );
        assert_eq!(
            follow_member(&file, "/group1", "soft").unwrap(),
            MemberLink::Target("/group1/subgroup1".to_string())
        );
        assert_eq!(
            follow_member(&file, "/group1", "ext").unwrap(),
            MemberLink::Target("other.h5//data".to_string())
        );
        assert!(follow_member(&file, "/group1", "missing").is_err());

        let mut visited = VisitedSet::new();
        assert_eq!(visited.alias_of(&file, "/group1/again").unwrap(), None);
        visited.record(file.identity("/group1/subgroup1").unwrap(), "/group1/subgroup1");
        assert_eq!(
            visited.alias_of(&file, "/group1/again").unwrap().as_deref(),
            Some("/group1/subgroup1")
        );
        assert!(visited.alias_of(&file, "/nothing").is_err());
    }

    #[test]
    fn test_line_count_nested() {
        let mut inner = TreeNode::leaf("inner", "", NodeKind::Group);
        inner.children.push(TreeNode::leaf("x", "", NodeKind::Dataset));
        let mut root = TreeNode::leaf("root", "", NodeKind::Group);
        root.children.push(inner);
        root.children.push(TreeNode::leaf("y", "\t-> /x", NodeKind::Link));
        assert_eq!(root.line_count(), 4);
    }
}
