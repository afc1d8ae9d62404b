//! Integration tests for tree walking and text rendering.
//!
//! These tests exercise the walker and the text renderer together on the
//! shared sample container, including hard-link aliasing, depth limits,
//! attribute expansion and the JSON snapshot backend.

mod common;

use common::{sample_container, wide_container, write_sample_snapshot};
use h5glance::{
    group_to_string, ChildOrder, Container, TextTreeRenderer, TreeNode, TreeWalker, VisitedSet,
    WalkOptions,
};
use proptest::prelude::*;

fn render(container: &dyn Container, options: WalkOptions, depth: Option<usize>) -> String {
    let walker = TreeWalker::new(container, options);
    let tree = walker
        .walk("/", container.filename(), depth, &mut VisitedSet::new())
        .unwrap();
    TextTreeRenderer::plain().render_to_string(&tree)
}

fn expanded() -> WalkOptions {
    WalkOptions {
        expand_attrs: true,
        order: ChildOrder::Lexicographic,
    }
}

// =============================================================================
// Full renders
// =============================================================================

#[test]
fn test_full_tree() {
    let text = render(&sample_container(), WalkOptions::default(), None);
    assert_eq!(
        text,
        "sample.h5\n\
         ├dataset2\t[float32: 2 × 128 × 500]\n\
         ├group1 (2 attributes)\n\
         │ ├subgroup1\n\
         │ │ └dataset1\t[uint64: 200]\n\
         │ └subgroup2\n\
         │   └dataset1\t[int16: 12]\n\
         └synonyms\n\
         \x20 └folder\t= /group1/subgroup1\n"
    );
}

#[test]
fn test_expanded_attributes() {
    let text = render(&sample_container(), expanded(), None);
    assert!(text.contains(
        "├group1\n\
         │ ├2 attributes:\n\
         │ │ ├string: 'foo'\n\
         │ │ └array: array [float64: 3 × 4]\n\
         │ ├subgroup1\n"
    ));
    assert!(!text.contains("(2 attributes)"));
}

#[test]
fn test_depth_limited_tree() {
    let text = render(&sample_container(), WalkOptions::default(), Some(1));
    assert_eq!(
        text,
        "sample.h5\n\
         ├dataset2\t[float32: 2 × 128 × 500]\n\
         ├group1\t(2 children) (2 attributes)\n\
         └synonyms\t(1 children)\n"
    );
}

#[test]
fn test_alias_has_no_children() {
    let file = sample_container();
    let tree = TreeWalker::new(&file, WalkOptions::default())
        .walk("/", "sample.h5", None, &mut VisitedSet::new())
        .unwrap();
    let folder = &tree.children[2].children[0];
    assert_eq!(folder.label, "folder");
    assert_eq!(folder.detail, "\t= /group1/subgroup1");
    assert!(folder.children.is_empty());
}

#[test]
fn test_visited_set_spans_walks() {
    // Walking the alias first makes it the expanded copy.
    let file = sample_container();
    let walker = TreeWalker::new(&file, WalkOptions::default());
    let mut visited = VisitedSet::new();
    let first = walker
        .walk("/synonyms", "synonyms", None, &mut visited)
        .unwrap();
    assert_eq!(first.children[0].children.len(), 1);

    let second = walker.walk("/group1", "group1", None, &mut visited).unwrap();
    assert_eq!(second.children[0].detail, "\t= /synonyms/folder");
}

#[test]
fn test_group_to_string_default_depth() {
    let text = group_to_string(&sample_container(), "/group1", false, Some(1)).unwrap();
    assert_eq!(
        text,
        "sample.h5/group1 (2 attributes)\n\
         ├subgroup1\t(1 children)\n\
         └subgroup2\t(1 children)\n"
    );
}

#[test]
fn test_snapshot_matches_built_container() {
    let (_dir, path) = write_sample_snapshot();
    let opened = h5glance::open(&path).unwrap();
    assert_eq!(opened.filename(), path.display().to_string());

    let walker = TreeWalker::new(opened.as_ref(), WalkOptions::default());
    let tree = walker
        .walk("/", "sample.h5", None, &mut VisitedSet::new())
        .unwrap();
    let from_snapshot = TextTreeRenderer::plain().render_to_string(&tree);
    assert_eq!(
        from_snapshot,
        render(&sample_container(), WalkOptions::default(), None)
    );
}

#[test]
fn test_streaming_matches_collected() {
    let file = sample_container();
    let tree = TreeWalker::new(&file, expanded())
        .walk("/", "sample.h5", None, &mut VisitedSet::new())
        .unwrap();
    let renderer = TextTreeRenderer::new(true);
    let mut streamed = Vec::new();
    renderer.print_tree(&tree, &mut streamed).unwrap();
    assert_eq!(
        String::from_utf8(streamed).unwrap(),
        renderer.render_to_string(&tree)
    );
}

#[test]
fn test_colored_labels() {
    let file = sample_container();
    let tree = TreeWalker::new(&file, WalkOptions::default())
        .walk("/", "sample.h5", None, &mut VisitedSet::new())
        .unwrap();
    let lines = TextTreeRenderer::new(true).render(&tree);
    assert_eq!(lines[0], "\u{1b}[94msample.h5\u{1b}[0m");
    assert_eq!(
        lines[1],
        "├\u{1b}[1mdataset2\u{1b}[0m\t[float32: 2 × 128 × 500]"
    );
}

// =============================================================================
// Properties
// =============================================================================

fn max_depth(node: &TreeNode) -> usize {
    node.children.iter().map(|c| 1 + max_depth(c)).max().unwrap_or(0)
}

proptest! {
    #[test]
    fn prop_line_count_matches_render(width in 1usize..4, depth in 1usize..4) {
        let file = wide_container(width, depth);
        let tree = TreeWalker::new(&file, WalkOptions::default())
            .walk("/", "wide.h5", None, &mut VisitedSet::new())
            .unwrap();
        let groups: usize = (1..=depth).map(|d| width.pow(d as u32)).sum();

        prop_assert_eq!(tree.line_count(), 1 + 2 * groups);
        prop_assert_eq!(TextTreeRenderer::plain().render(&tree).len(), tree.line_count());
    }

    #[test]
    fn prop_render_is_idempotent(width in 1usize..4, depth in 1usize..4, expand in any::<bool>()) {
        let file = wide_container(width, depth);
        let options = WalkOptions { expand_attrs: expand, ..WalkOptions::default() };
        prop_assert_eq!(render(&file, options, None), render(&file, options, None));
    }

    #[test]
    fn prop_depth_limit_is_respected(limit in 0usize..4) {
        let file = wide_container(2, 4);
        let tree = TreeWalker::new(&file, WalkOptions::default())
            .walk("/", "wide.h5", Some(limit), &mut VisitedSet::new())
            .unwrap();
        prop_assert!(max_depth(&tree) <= limit);
        let cut_off = tree.children.iter().all(|c| {
            limit != 1 || c.detail == "\t(3 children)"
        });
        prop_assert!(cut_off);
    }
}
