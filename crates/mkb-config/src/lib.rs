//! Configuration loading for mkb
//!
//! This crate reads the parent build configuration (the `buildout.cfg` INI
//! dialect), parses the free-form `extra_options` blob and layers option
//! sources into the option set a recipe instance works from.

pub mod cfg;
pub mod extra;
pub mod merge;
pub mod toml;

// Re-export main types
pub use cfg::{load_parent_config, parent_config_from_str};
pub use extra::ExtraOptionsTree;
pub use merge::{parse_override, ConfigLayering, ConfigLoader, ConfigSource};
pub use toml::GlobalSettings;

use mkb_core::error::MkbError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, MkbError>;
