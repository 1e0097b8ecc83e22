//! Path utilities for moving references from the parent build into a sub-build.
//!
//! The rewriter is a plain substring replacement, not path-segment aware:
//! `/src/build` also matches inside `/src/buildbot`. Callers rely on this
//! exact behavior.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::MkbResult;
use crate::types::ParentConfig;

/// Directory of the sub-build named `name`
pub fn sub_build_dir(parts_directory: &str, name: &str) -> Utf8PathBuf {
    Utf8Path::new(parts_directory).join(name)
}

/// Source checkout of a developed egg inside the parent build
pub fn develop_path(directory: &str, egg: &str) -> Utf8PathBuf {
    Utf8Path::new(directory).join("src").join(egg)
}

/// Rewrites parent-root paths so they point into the sub-build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewriter {
    parent_path: String,
    child_path: String,
}

impl PathRewriter {
    /// Create a rewriter from explicit parent and child roots
    pub fn new(parent_path: impl Into<String>, child_path: impl Into<String>) -> Self {
        Self {
            parent_path: parent_path.into(),
            child_path: child_path.into(),
        }
    }

    /// Rewriter for the sub-build `name` of a parent configuration
    pub fn for_part(parent: &ParentConfig, name: &str) -> MkbResult<Self> {
        let directory = parent.directory()?;
        let child = sub_build_dir(parent.parts_directory()?, name);
        Ok(Self::new(directory, child.into_string()))
    }

    /// Parent build directory being replaced
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    /// Sub-build directory substituted in
    pub fn child_path(&self) -> &str {
        &self.child_path
    }

    /// Replace every occurrence of the parent root with the child root
    pub fn rewrite(&self, value: &str) -> String {
        // An empty pattern would match between every character.
        if self.parent_path.is_empty() {
            return value.to_string();
        }
        value.replace(&self.parent_path, &self.child_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_parent_path() {
        let rewriter = PathRewriter::new("/src/build", "/src/build/parts/sub");
        assert_eq!(
            rewriter.rewrite("/src/build/x.cfg"),
            "/src/build/parts/sub/x.cfg"
        );
        assert_eq!(rewriter.rewrite("/etc/other.cfg"), "/etc/other.cfg");
    }

    #[test]
    fn test_rewrite_every_occurrence() {
        let rewriter = PathRewriter::new("/p", "/p/parts/s");
        assert_eq!(rewriter.rewrite("/p/a /p/b"), "/p/parts/s/a /p/parts/s/b");
    }

    #[test]
    fn test_rewrite_is_substring_based() {
        let rewriter = PathRewriter::new("/src/build", "/src/build/parts/sub");
        assert_eq!(
            rewriter.rewrite("/src/buildbot/x"),
            "/src/build/parts/subbot/x"
        );
    }

    #[test]
    fn test_empty_parent_path_is_identity() {
        let rewriter = PathRewriter::new("", "/child");
        assert_eq!(rewriter.rewrite("value"), "value");
    }

    #[test]
    fn test_sub_build_and_develop_paths() {
        assert_eq!(sub_build_dir("/root/parts", "sub"), Utf8Path::new("/root/parts/sub"));
        assert_eq!(develop_path("/root", "mod1"), Utf8Path::new("/root/src/mod1"));
    }
}
