//! Parsing of the free-form `extra_options` blob.
//!
//! Each line is either a `[section]` marker or a raw option line. Lines
//! before the first marker belong to the implicit `buildout` section. A
//! section named twice keeps collecting lines into the same bucket.

use indexmap::IndexMap;
use mkb_core::types::BUILDOUT_SECTION;

/// Section name to raw option lines, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraOptionsTree {
    buckets: IndexMap<String, Vec<String>>,
}

/// One classified input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Section(&'a str),
    Raw(&'a str),
}

impl ExtraOptionsTree {
    /// Parse the `extra_options` value
    pub fn parse(text: &str) -> Self {
        let mut tree = Self::default();
        let mut current = BUILDOUT_SECTION.to_string();

        for raw in text.lines() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            match classify(trimmed) {
                Line::Section(name) => {
                    current = name.to_string();
                    tree.buckets.entry(current.clone()).or_default();
                }
                Line::Raw(line) => {
                    tree.buckets
                        .entry(current.clone())
                        .or_default()
                        .push(line.to_string());
                }
            }
        }

        tree
    }

    /// Lines for a section, if any were given
    pub fn get(&self, section: &str) -> Option<&[String]> {
        self.buckets.get(section).map(Vec::as_slice)
    }

    /// Remove and return a section's lines
    pub fn take(&mut self, section: &str) -> Option<Vec<String>> {
        self.buckets.shift_remove(section)
    }

    /// Lines of the implicit `buildout` section
    pub fn buildout_lines(&self) -> &[String] {
        self.get(BUILDOUT_SECTION).unwrap_or(&[])
    }

    /// Sections other than `buildout`, in first-seen order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .filter(|(name, _)| name.as_str() != BUILDOUT_SECTION)
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }

    /// Whether no section was found
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn classify(line: &str) -> Line<'_> {
    if let Some(inner) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let name = inner.trim();
        if !name.is_empty() {
            return Line::Section(name);
        }
    }
    Line::Raw(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlabelled_lines_go_to_buildout() {
        let tree = ExtraOptionsTree::parse("newest = false\nunzip = true\n");
        assert_eq!(tree.buildout_lines(), ["newest = false", "unzip = true"]);
        assert_eq!(tree.sections().count(), 0);
    }

    #[test]
    fn test_section_markers() {
        let tree = ExtraOptionsTree::parse(
            "newest = false\n[instance]\nhttp-address = 8080\n\n[test]\ndefaults = ['-v']\n",
        );

        assert_eq!(tree.buildout_lines(), ["newest = false"]);
        assert_eq!(tree.get("instance").unwrap(), ["http-address = 8080"]);
        let names: Vec<&str> = tree.sections().map(|(name, _)| name).collect();
        assert_eq!(names, ["instance", "test"]);
    }

    #[test]
    fn test_repeated_marker_appends() {
        let mut tree = ExtraOptionsTree::parse("[a]\nx = 1\n[b]\ny = 2\n[a]\nz = 3\n");
        assert_eq!(tree.get("a").unwrap(), ["x = 1", "z = 3"]);

        assert_eq!(tree.take("a").unwrap().len(), 2);
        assert!(tree.get("a").is_none());
        assert_eq!(tree.sections().count(), 1);
    }

    #[test]
    fn test_explicit_buildout_marker() {
        let tree = ExtraOptionsTree::parse("[a]\nx = 1\n[buildout]\nnewest = false\n");
        assert_eq!(tree.buildout_lines(), ["newest = false"]);
    }

    #[test]
    fn test_empty_brackets_are_option_lines() {
        let tree = ExtraOptionsTree::parse("[]\n");
        assert_eq!(tree.buildout_lines(), ["[]"]);
    }
}
