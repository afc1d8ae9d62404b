//! Box-drawing text rendering of display trees.

use std::io::{self, IsTerminal, Write};

use crate::config::Config;
use crate::container::Container;
use crate::error::Result;
use crate::output::Colors;
use crate::tree::{TreeNode, TreeWalker, VisitedSet, WalkOptions};

/// Renders a [`TreeNode`] as indented lines.
///
/// Children hang off `├` and `└` connectors; deeper levels are indented by
/// `│ ` under an unfinished parent and two spaces under a last child.
///
/// # Examples
///
/// ```
/// use h5glance::output::TextTreeRenderer;
/// use h5glance::tree::{NodeKind, TreeNode};
///
/// let mut root = TreeNode::leaf("sample.h5", "", NodeKind::Group);
/// root.children.push(TreeNode::leaf("a", "\t[int16: 12]", NodeKind::Dataset));
/// root.children.push(TreeNode::leaf("b", "\t-> /a", NodeKind::Link));
///
/// let lines = TextTreeRenderer::plain().render(&root);
/// assert_eq!(lines, vec!["sample.h5", "├a\t[int16: 12]", "└b\t-> /a"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextTreeRenderer {
    colors: Colors,
}

struct Frame<'a> {
    children: &'a [TreeNode],
    idx: usize,
    prefix: String,
}

impl TextTreeRenderer {
    /// A renderer that colours labels when `colors` is set.
    #[must_use]
    pub const fn new(colors: bool) -> Self {
        Self {
            colors: if colors { Colors::DEFAULT } else { Colors::NONE },
        }
    }

    /// A renderer without colours.
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(false)
    }

    /// A renderer following the configured colour policy for stdout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.colors.resolve(io::stdout().is_terminal()))
    }

    /// The escape codes in use.
    #[must_use]
    pub const fn colors(&self) -> Colors {
        self.colors
    }

    /// A node's own line, without any prefix.
    #[must_use]
    pub fn line(&self, node: &TreeNode) -> String {
        format!("{}{}", self.colors.paint(&node.label, node.kind), node.detail)
    }

    /// Render the whole tree into lines.
    #[must_use]
    pub fn render(&self, node: &TreeNode) -> Vec<String> {
        let mut lines = Vec::with_capacity(node.line_count());
        self.render_into(node, "", "", &mut lines);
        lines
    }

    fn render_into(&self, node: &TreeNode, first: &str, rest: &str, lines: &mut Vec<String>) {
        lines.push(format!("{first}{}", self.line(node)));
        let last = node.children.len().saturating_sub(1);
        for (i, child) in node.children.iter().enumerate() {
            let (connector, indent) = connectors(i == last);
            self.render_into(
                child,
                &format!("{rest}{connector}"),
                &format!("{rest}{indent}"),
                lines,
            );
        }
    }

    /// Write the tree line by line.
    ///
    /// Produces the same text as [`TextTreeRenderer::render`] with a newline
    /// after every line, without recursing.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn print_tree(&self, node: &TreeNode, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", self.line(node))?;

        let mut stack = vec![Frame {
            children: &node.children,
            idx: 0,
            prefix: String::new(),
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.idx >= frame.children.len() {
                stack.pop();
                continue;
            }

            let children = frame.children;
            let child = &children[frame.idx];
            frame.idx += 1;
            let is_last = frame.idx == children.len();
            let (connector, indent) = connectors(is_last);

            writeln!(out, "{}{connector}{}", frame.prefix, self.line(child))?;

            if !child.children.is_empty() {
                let prefix = format!("{}{indent}", frame.prefix);
                stack.push(Frame {
                    children: &child.children,
                    idx: 0,
                    prefix,
                });
            }
        }
        Ok(())
    }

    /// Render the tree to a string with a trailing newline.
    #[must_use]
    pub fn render_to_string(&self, node: &TreeNode) -> String {
        let mut text = self.render(node).join("\n");
        text.push('\n');
        text
    }
}

impl Default for TextTreeRenderer {
    fn default() -> Self {
        Self::plain()
    }
}

const fn connectors(is_last: bool) -> (&'static str, &'static str) {
    if is_last {
        ("└", "  ")
    } else {
        ("├", "│ ")
    }
}

/// Render a group as plain text, labelled `<filename>/<path>`.
///
/// `max_depth` works as in [`TreeWalker::walk`]; one level is the usual
/// choice for embedding a quick overview elsewhere.
///
/// # Errors
///
/// Returns an error if the object at `path` cannot be inspected.
///
/// # Examples
///
/// ```
/// use h5glance::{group_to_string, Datatype, MemoryContainer};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/group1/sub/data", Datatype::uint(8), &[4]).unwrap();
///
/// let text = group_to_string(&file, "/group1", false, Some(1)).unwrap();
/// assert_eq!(text, "sample.h5/group1\n└sub\t(1 children)\n");
/// ```
pub fn group_to_string(
    container: &dyn Container,
    path: &str,
    expand_attrs: bool,
    max_depth: Option<usize>,
) -> Result<String> {
    let label = format!("{}/{}", container.filename(), path.trim_start_matches('/'));
    let walker = TreeWalker::new(
        container,
        WalkOptions {
            expand_attrs,
            ..WalkOptions::default()
        },
    );
    let tree = walker.walk(path, &label, max_depth, &mut VisitedSet::new())?;
    Ok(TextTreeRenderer::plain().render_to_string(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn nested() -> TreeNode {
        let mut sub1 = TreeNode::leaf("subgroup1", "", NodeKind::Group);
        sub1.children
            .push(TreeNode::leaf("dataset1", "\t[uint64: 200]", NodeKind::Dataset));
        let mut sub2 = TreeNode::leaf("subgroup2", "", NodeKind::Group);
        sub2.children
            .push(TreeNode::leaf("dataset1", "\t[int16: 12]", NodeKind::Dataset));
        let mut group1 = TreeNode::leaf("group1", "", NodeKind::Group);
        group1.children.push(sub1);
        group1.children.push(sub2);
        let mut root = TreeNode::leaf("sample.h5", "", NodeKind::Group);
        root.children.push(group1);
        root.children
            .push(TreeNode::leaf("link", "\t-> /group1", NodeKind::Link));
        root
    }

    #[test]
    fn test_render_prefixes() {
        let lines = TextTreeRenderer::plain().render(&nested());
        assert_eq!(
            lines,
            vec![
                "sample.h5",
                "├group1",
                "│ ├subgroup1",
                "│ │ └dataset1\t[uint64: 200]",
                "│ └subgroup2",
                "│   └dataset1\t[int16: 12]",
                "└link\t-> /group1",
            ]
        );
    }

    #[test]
    fn test_print_tree_matches_render() {
        let renderer = TextTreeRenderer::new(true);
        let tree = nested();
        let mut out = Vec::new();
        renderer.print_tree(&tree, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), renderer.render_to_string(&tree));
    }

    #[test]
    fn test_colored_line() {
        let renderer = TextTreeRenderer::new(true);
        let node = TreeNode::leaf("dataset1", "\t[int16: 12]", NodeKind::Dataset);
        assert_eq!(renderer.line(&node), "\u{1b}[1mdataset1\u{1b}[0m\t[int16: 12]");
        let link = TreeNode::leaf("l", "\t-> /x", NodeKind::Link);
        assert_eq!(renderer.line(&link), "\u{1b}[95ml\u{1b}[0m\t-> /x");
    }

    #[test]
    fn test_single_node() {
        let node = TreeNode::leaf("only", "", NodeKind::Plain);
        assert_eq!(TextTreeRenderer::plain().render_to_string(&node), "only\n");
    }
}
