//! Read-only view of the parent build configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MkbError, MkbResult};

/// Name of the distinguished main section
pub const BUILDOUT_SECTION: &str = "buildout";

/// Key naming the managed-sources section
pub const SOURCES_KEY: &str = "sources";

/// Options of one section, in declaration order
pub type Section = IndexMap<String, String>;

/// Parent configuration: section name to options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentConfig {
    sections: IndexMap<String, Section>,
}

impl ParentConfig {
    /// Wrap fully resolved sections
    pub fn from_sections(sections: IndexMap<String, Section>) -> Self {
        Self { sections }
    }

    /// Get a section by name
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Whether a section is declared
    pub fn contains_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names in declaration order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Look up `[section] option`
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|options| options.get(option))
            .map(String::as_str)
    }

    /// The `[buildout]` section
    pub fn buildout(&self) -> MkbResult<&Section> {
        self.section(BUILDOUT_SECTION)
            .ok_or_else(|| MkbError::UnknownSection {
                section: BUILDOUT_SECTION.to_string(),
            })
    }

    /// Root directory of the parent build
    pub fn directory(&self) -> MkbResult<&str> {
        self.required_buildout_option("directory")
    }

    /// Directory holding the parent's parts
    pub fn parts_directory(&self) -> MkbResult<&str> {
        self.required_buildout_option("parts-directory")
    }

    /// Newline-separated develop paths, if declared
    pub fn develop(&self) -> Option<&str> {
        self.get(BUILDOUT_SECTION, "develop")
    }

    /// Name of the managed-sources section, if declared
    pub fn sources_section(&self) -> Option<&str> {
        self.get(BUILDOUT_SECTION, SOURCES_KEY)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    fn required_buildout_option(&self, option: &str) -> MkbResult<&str> {
        self.buildout()?
            .get(option)
            .map(String::as_str)
            .ok_or_else(|| MkbError::MissingOption {
                section: BUILDOUT_SECTION.to_string(),
                option: option.to_string(),
            })
    }
}
