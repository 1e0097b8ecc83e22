//! Core data types for sub-build generation.
//!
//! This module provides the types shared by the loader, the recipe and the CLI:
//! - Option sets and their typed, validated view
//! - The read-only parent configuration

pub mod options;
pub mod parent;

// Re-export all public types
pub use options::{
    split_lines, OptionKey, OptionSet, RecipeOptions, APPEND_MARKER, DEFAULT_BUILDOUT_FILE,
    DEFAULT_BUILDOUT_RENAME,
};
pub use parent::{ParentConfig, Section, BUILDOUT_SECTION, SOURCES_KEY};
