//! # mkb-core
//!
//! Core types and utilities shared across all mkb crates.
//!
//! This crate provides:
//! - OptionSet with append-fragment normalization
//! - RecipeOptions, the typed view of a recipe instance's options
//! - ParentConfig, a read-only view of the enclosing build configuration
//! - MkbError enum for unified error handling
//! - Path rewriting between the parent and the sub-build
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (OptionSet, RecipeOptions, ParentConfig)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{MkbError, MkbResult};
pub use types::{OptionKey, OptionSet, ParentConfig, RecipeOptions, Section};
pub use utils::PathRewriter;
