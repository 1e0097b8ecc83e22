//! Utility functions and helpers.
//!
//! Common functionality used across multiple mkb crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{develop_path, sub_build_dir, PathRewriter};
