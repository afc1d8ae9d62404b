//! Terminal output: tree text, dataset details and paging.

pub mod dataset;
pub mod pager;
pub mod text;

use crate::tree::NodeKind;

pub use dataset::{display_object, print_dataset_info};
pub use pager::MaybePagedOutput;
pub use text::{group_to_string, TextTreeRenderer};

/// ANSI escape codes used to highlight tree labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colors {
    /// Start of a dataset label.
    pub dataset: &'static str,
    /// Start of a group label.
    pub group: &'static str,
    /// Start of a link label.
    pub link: &'static str,
    /// Ends a highlighted label.
    pub reset: &'static str,
}

impl Colors {
    /// No highlighting at all.
    pub const NONE: Self = Self {
        dataset: "",
        group: "",
        link: "",
        reset: "",
    };

    /// Bold datasets, bright blue groups, bright magenta links.
    pub const DEFAULT: Self = Self {
        dataset: "\u{1b}[1m",
        group: "\u{1b}[94m",
        link: "\u{1b}[95m",
        reset: "\u{1b}[0m",
    };

    /// Escape code opening a label of `kind`; empty for unhighlighted kinds.
    #[must_use]
    pub const fn start(&self, kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::Dataset => self.dataset,
            NodeKind::Group => self.group,
            NodeKind::Link => self.link,
            NodeKind::Plain => "",
        }
    }

    /// Wrap `label` in the escape codes for `kind`.
    ///
    /// # Examples
    ///
    /// ```
    /// use h5glance::output::Colors;
    /// use h5glance::tree::NodeKind;
    ///
    /// assert_eq!(Colors::DEFAULT.paint("data", NodeKind::Dataset), "\u{1b}[1mdata\u{1b}[0m");
    /// assert_eq!(Colors::DEFAULT.paint("1 attributes:", NodeKind::Plain), "1 attributes:");
    /// assert_eq!(Colors::NONE.paint("grp", NodeKind::Group), "grp");
    /// ```
    #[must_use]
    pub fn paint(&self, label: &str, kind: NodeKind) -> String {
        let start = self.start(kind);
        if start.is_empty() {
            label.to_string()
        } else {
            format!("{start}{label}{}", self.reset)
        }
    }
}
