//! Completion of in-file object paths.

use crate::container::{join_path, normalize_path, Container, ObjectKind};
use crate::error::Result;

/// Completes partially typed object paths.
///
/// Paths are written without a leading slash, as they appear after
/// `<file>/` in the prompt. The last component is matched
/// case-insensitively against the members of its group; groups are
/// suggested with a trailing `/` so completion can continue into them.
///
/// # Examples
///
/// ```
/// use h5glance::{Datatype, MemoryContainer, PathCompleter};
///
/// let mut file = MemoryContainer::new("sample.h5");
/// file.create_dataset("/Group1/data", Datatype::int(8), &[3]).unwrap();
/// file.create_dataset("/group2", Datatype::int(8), &[3]).unwrap();
///
/// let mut completer = PathCompleter::new(&file);
/// assert_eq!(completer.completions("gr").unwrap(), vec!["Group1/", "group2"]);
/// assert_eq!(completer.completions("Group1/d").unwrap(), vec!["Group1/data"]);
/// ```
pub struct PathCompleter<'a> {
    container: &'a dyn Container,
    cache: Option<(String, Vec<String>)>,
}

impl<'a> PathCompleter<'a> {
    /// A completer over `container`.
    #[must_use]
    pub fn new(container: &'a dyn Container) -> Self {
        Self {
            container,
            cache: None,
        }
    }

    /// Candidate paths extending `text`, sorted by name.
    ///
    /// The result for the most recent `text` is cached, since line editors
    /// ask for the same completions once per candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the part of
    /// `text` before the last `/` is not a group.
    pub fn completions(&mut self, text: &str) -> Result<Vec<String>> {
        if let Some((cached, results)) = &self.cache {
            if cached == text {
                return Ok(results.clone());
            }
        }

        let (parent, prefix) = match text.rsplit_once('/') {
            Some((parent, prefix)) => (parent, prefix),
            None => ("", text),
        };
        let group = normalize_path(parent);
        let lead = if parent.is_empty() {
            String::new()
        } else {
            format!("{parent}/")
        };

        let prefix = prefix.to_lowercase();
        let mut names = self.container.list_children(&group)?;
        names.sort();

        let results: Vec<String> = names
            .into_iter()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .map(|name| {
                let is_group = self
                    .container
                    .metadata(&join_path(&group, &name))
                    .is_ok_and(|meta| meta.kind == ObjectKind::Group);
                let slash = if is_group { "/" } else { "" };
                format!("{lead}{name}{slash}")
            })
            .collect();

        self.cache = Some((text.to_string(), results.clone()));
        Ok(results)
    }

    /// The `state`-th candidate for `text`, as readline-style completers
    /// are queried; `None` past the end or on error.
    pub fn complete(&mut self, text: &str, state: usize) -> Option<String> {
        self.completions(text).ok()?.into_iter().nth(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::datatype::Datatype;

    fn sample() -> MemoryContainer {
        let mut file = MemoryContainer::new("sample.h5");
        file.create_dataset("/group1/subgroup1/dataset1", Datatype::uint(64), &[200])
            .unwrap();
        file.create_dataset("/group1/subgroup2/dataset1", Datatype::int(16), &[12])
            .unwrap();
        file.create_dataset("/group1/dataset2", Datatype::float(32), &[3])
            .unwrap();
        file.link_soft("/latest", "/group1").unwrap();
        file
    }

    #[test]
    fn test_top_level() {
        let file = sample();
        let mut completer = PathCompleter::new(&file);
        assert_eq!(completer.completions("").unwrap(), vec!["group1/", "latest/"]);
    }

    #[test]
    fn test_nested_prefix() {
        let file = sample();
        let mut completer = PathCompleter::new(&file);
        assert_eq!(
            completer.completions("group1/SUB").unwrap(),
            vec!["group1/subgroup1/", "group1/subgroup2/"]
        );
        assert_eq!(
            completer.completions("group1/d").unwrap(),
            vec!["group1/dataset2"]
        );
    }

    #[test]
    fn test_complete_by_state() {
        let file = sample();
        let mut completer = PathCompleter::new(&file);
        assert_eq!(completer.complete("group1/s", 1).as_deref(), Some("group1/subgroup2/"));
        assert_eq!(completer.complete("group1/s", 2), None);
        assert_eq!(completer.complete("nope/x", 0), None);
    }

    #[test]
    fn test_missing_group() {
        let file = sample();
        let mut completer = PathCompleter::new(&file);
        assert!(completer.completions("missing/").unwrap_err().is_not_found());
    }
}
