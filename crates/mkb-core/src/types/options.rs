//! Recipe options: the raw string-keyed option bag and its typed view.
//!
//! Options reach a recipe instance as plain `name = value` strings. Keys
//! ending in `+` mean "append to `name`" and are folded into their base key
//! by [`OptionSet::normalize`] before anything else looks at them.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MkbError, MkbResult};

/// Suffix marking an option as an append fragment
pub const APPEND_MARKER: char = '+';

/// Config filename the scaffolding tool produces
pub const DEFAULT_BUILDOUT_FILE: &str = "buildout.cfg";

/// Name the scaffolded config is moved to when the sub-build extends it
pub const DEFAULT_BUILDOUT_RENAME: &str = "buildout_base.cfg";

/// Recognized option names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKey {
    /// Entry point of the recipe, always passed by the parent build
    Recipe,
    /// Python interpreter used to bootstrap the sub-build
    Python,
    /// Scaffolding tool executable
    Paster,
    /// Scaffolding template name
    Template,
    /// Config file the synthesized config extends
    BuildoutFile,
    /// Name the scaffolded config is renamed to
    BuildoutRename,
    /// Answers fed to the scaffolding tool on stdin
    PasterCommands,
    /// Parent sections copied into the sub-build
    ExtraParts,
    /// Extra packages added to the sub-build eggs
    ExtraEggs,
    /// Free-form options, optionally section-qualified
    ExtraOptions,
    /// Test runner script inside the sub-build
    TestRunner,
}

impl OptionKey {
    /// Every recognized key
    pub const ALL: [OptionKey; 11] = [
        OptionKey::Recipe,
        OptionKey::Python,
        OptionKey::Paster,
        OptionKey::Template,
        OptionKey::BuildoutFile,
        OptionKey::BuildoutRename,
        OptionKey::PasterCommands,
        OptionKey::ExtraParts,
        OptionKey::ExtraEggs,
        OptionKey::ExtraOptions,
        OptionKey::TestRunner,
    ];

    /// Option name as written in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Recipe => "recipe",
            OptionKey::Python => "python",
            OptionKey::Paster => "paster",
            OptionKey::Template => "template",
            OptionKey::BuildoutFile => "buildout_file",
            OptionKey::BuildoutRename => "buildout_rename",
            OptionKey::PasterCommands => "paster_commands",
            OptionKey::ExtraParts => "extra_parts",
            OptionKey::ExtraEggs => "extra_eggs",
            OptionKey::ExtraOptions => "extra_options",
            OptionKey::TestRunner => "test_runner",
        }
    }

    /// Look up a key by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Built-in default value, if the key has one
    pub fn default_value(self) -> &'static str {
        match self {
            OptionKey::Python => "python",
            OptionKey::Paster => "paster",
            OptionKey::Template => "plone",
            OptionKey::BuildoutFile => DEFAULT_BUILDOUT_FILE,
            OptionKey::BuildoutRename => DEFAULT_BUILDOUT_RENAME,
            _ => "",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-keyed option bag for one recipe instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    values: BTreeMap<String, String>,
}

impl OptionSet {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Option set holding the built-in defaults
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        for key in OptionKey::ALL {
            if key == OptionKey::Recipe {
                continue;
            }
            set.insert(key.as_str(), key.default_value());
        }
        set
    }

    /// Insert or replace an option. The name is trimmed.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().trim().to_string(), value.into());
    }

    /// Get an option value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Get a recognized option value, empty when unset
    pub fn value(&self, key: OptionKey) -> &str {
        self.get(key.as_str()).unwrap_or("")
    }

    /// Whether an option is set
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate options in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.values.iter()
    }

    /// Overlay another option set; its values win
    pub fn merge(&mut self, overrides: OptionSet) {
        self.values.extend(overrides.values);
    }

    /// Fold every `name+` entry into `name`.
    ///
    /// An existing base value gets the fragment appended after a newline,
    /// otherwise the fragment becomes the base value. Afterwards no key
    /// carries the append marker. Two distinct raw keys folding into the
    /// same base (`eggs+` and `eggs +`) are rejected.
    pub fn normalize(mut self) -> MkbResult<Self> {
        let append_keys: Vec<String> = self
            .values
            .keys()
            .filter(|key| key.ends_with(APPEND_MARKER))
            .cloned()
            .collect();

        let mut folded: HashMap<String, String> = HashMap::new();

        for raw_key in append_keys {
            let fragment = match self.values.remove(&raw_key) {
                Some(fragment) => fragment,
                None => continue,
            };
            let base = append_base(&raw_key).to_string();

            if let Some(previous) = folded.insert(base.clone(), raw_key.clone()) {
                return Err(MkbError::ConfigValidation {
                    field: base,
                    reason: format!(
                        "multiple append fragments target the same option ('{}' and '{}')",
                        previous, raw_key
                    ),
                });
            }

            match self.values.get_mut(&base) {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(&fragment);
                }
                None => {
                    self.values.insert(base, fragment);
                }
            }
        }

        Ok(self)
    }
}

impl FromIterator<(String, String)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a OptionSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Base option name of an append key
fn append_base(raw_key: &str) -> &str {
    raw_key
        .trim_end_matches(|c: char| c == APPEND_MARKER || c.is_whitespace())
}

/// Split a newline-separated list, dropping blank entries
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed view of a normalized option set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOptions {
    /// Interpreter path
    pub python: String,
    /// Scaffolding tool path
    pub paster: String,
    /// Scaffolding template name
    pub template: String,
    /// Config filename the synthesized config extends
    pub buildout_file: String,
    /// Rename target for the scaffolded default config
    pub buildout_rename: String,
    /// Scaffolding tool stdin
    pub paster_commands: String,
    /// Parent sections to copy, validated against the parent config
    pub extra_parts: Vec<String>,
    /// Extra eggs, one per entry
    pub extra_eggs: Vec<String>,
    /// Raw `extra_options` text
    pub extra_options: String,
    /// Test runner script name
    pub test_runner: Option<String>,
}

impl RecipeOptions {
    /// Build the typed view. `extra_parts` is only split here; filtering
    /// against the parent configuration is the validator's job.
    pub fn from_option_set(options: &OptionSet) -> Self {
        let test_runner = options.value(OptionKey::TestRunner).trim();

        Self {
            python: options.value(OptionKey::Python).trim().to_string(),
            paster: options.value(OptionKey::Paster).trim().to_string(),
            template: options.value(OptionKey::Template).trim().to_string(),
            buildout_file: options.value(OptionKey::BuildoutFile).trim().to_string(),
            buildout_rename: options.value(OptionKey::BuildoutRename).trim().to_string(),
            paster_commands: options.value(OptionKey::PasterCommands).to_string(),
            extra_parts: split_lines(options.value(OptionKey::ExtraParts)),
            extra_eggs: split_lines(options.value(OptionKey::ExtraEggs)),
            extra_options: options.value(OptionKey::ExtraOptions).to_string(),
            test_runner: if test_runner.is_empty() {
                None
            } else {
                Some(test_runner.to_string())
            },
        }
    }

    /// Whether the synthesized config extends the renamed scaffold output
    pub fn extends_renamed_base(&self) -> bool {
        self.buildout_file == DEFAULT_BUILDOUT_FILE
    }

    /// Name written after `extends =`
    pub fn extends_target(&self) -> &str {
        if self.extends_renamed_base() {
            &self.buildout_rename
        } else {
            &self.buildout_file
        }
    }
}

impl Default for RecipeOptions {
    fn default() -> Self {
        Self::from_option_set(&OptionSet::with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> OptionSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let options = OptionSet::with_defaults();
        assert_eq!(options.get("python"), Some("python"));
        assert_eq!(options.get("paster"), Some("paster"));
        assert_eq!(options.get("template"), Some("plone"));
        assert_eq!(options.get("buildout_file"), Some("buildout.cfg"));
        assert_eq!(options.get("buildout_rename"), Some("buildout_base.cfg"));
        assert_eq!(options.get("extra_eggs"), Some(""));
        assert!(!options.contains("recipe"));
    }

    #[test]
    fn test_normalize_creates_missing_base() {
        let options = set(&[("extra_eggs+", "pkg1")]).normalize().unwrap();
        assert_eq!(options.get("extra_eggs"), Some("pkg1"));
        assert!(!options.contains("extra_eggs+"));
    }

    #[test]
    fn test_normalize_appends_to_existing_base() {
        let options = set(&[("extra_eggs", "pkg1"), ("extra_eggs+", "pkg2")])
            .normalize()
            .unwrap();
        assert_eq!(options.get("extra_eggs"), Some("pkg1\npkg2"));
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_normalize_rejects_two_fragments_for_one_base() {
        let mut options = OptionSet::new();
        options.insert("eggs+", "a");
        options.insert("eggs +", "b");

        let err = options.normalize().unwrap_err();
        assert!(matches!(err, MkbError::ConfigValidation { ref field, .. } if field == "eggs"));
    }

    #[test]
    fn test_merge_overrides_win() {
        let mut options = OptionSet::with_defaults();
        options.merge(set(&[("python", "/usr/bin/python2.7")]));
        assert_eq!(options.get("python"), Some("/usr/bin/python2.7"));
    }

    #[test]
    fn test_option_key_lookup() {
        assert_eq!(OptionKey::from_name("extra_parts"), Some(OptionKey::ExtraParts));
        assert_eq!(OptionKey::from_name("extra-parts"), None);
        for key in OptionKey::ALL {
            assert_eq!(OptionKey::from_name(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_recipe_options_typed_view() {
        let mut options = OptionSet::with_defaults();
        options.merge(set(&[
            ("extra_eggs", "\npkg1\n\n  pkg2  \n"),
            ("extra_parts", "A\nC\n"),
            ("test_runner", "  "),
        ]));

        let typed = RecipeOptions::from_option_set(&options);
        assert_eq!(typed.extra_eggs, vec!["pkg1", "pkg2"]);
        assert_eq!(typed.extra_parts, vec!["A", "C"]);
        assert_eq!(typed.test_runner, None);
        assert!(typed.extends_renamed_base());
        assert_eq!(typed.extends_target(), "buildout_base.cfg");
    }

    #[test]
    fn test_extends_custom_file_verbatim() {
        let mut options = OptionSet::with_defaults();
        options.insert("buildout_file", "development.cfg");

        let typed = RecipeOptions::from_option_set(&options);
        assert!(!typed.extends_renamed_base());
        assert_eq!(typed.extends_target(), "development.cfg");
    }
}
