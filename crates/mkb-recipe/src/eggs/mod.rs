//! Developed eggs of the parent build.
//!
//! Eggs come from the managed-sources section named by `[buildout] sources`
//! and from the last path segment of every `[buildout] develop` entry.
//! Discovery order is kept and duplicates are tolerated.

use mkb_core::types::ParentConfig;
use tracing::warn;

/// Package names of this recipe itself, never re-developed in a sub-build
pub const RESERVED_EGGS: [&str; 2] = ["zest.recipe.mk_buildout", "zest.recipe.mk-buildout"];

/// Collect the eggs the parent build develops from local source
pub fn developed_eggs(parent: &ParentConfig) -> Vec<String> {
    let mut eggs = Vec::new();

    if let Some(sources) = parent.sources_section() {
        match parent.section(sources) {
            Some(section) => eggs.extend(section.keys().cloned()),
            None => warn!("managed sources section [{}] not found", sources),
        }
    }

    if let Some(develop) = parent.develop() {
        eggs.extend(
            develop
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| last_segment(line).to_string()),
        );
    }

    eggs.retain(|egg| !egg.is_empty() && !RESERVED_EGGS.contains(&egg.as_str()));
    eggs
}

/// Text after the last `/`; empty for a path ending in `/`
fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}
