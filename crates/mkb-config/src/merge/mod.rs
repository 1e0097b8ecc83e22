//! Configuration discovery, option layering and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use mkb_core::error::MkbError;
use mkb_core::types::{OptionKey, OptionSet, ParentConfig, Section};

use tracing::debug;

use crate::toml::GlobalSettings;
use crate::ConfigResult;

/// Parent configuration filename looked up when none is given
pub const DEFAULT_PARENT_CONFIG: &str = "buildout.cfg";

/// Prefix of option environment overrides
pub const ENV_PREFIX: &str = "MKB_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Option layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// Site-wide settings file
    global_settings: Option<GlobalSettings>,
    /// Options from the part section of the parent config
    part_options: Option<Section>,
    /// Environment overrides
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides
    cli_overrides: Vec<(String, String)>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Parent config given on the command line
    Explicit(Utf8PathBuf),
    /// Parent config found by walking up from the working directory
    Discovered(Utf8PathBuf),
}

impl ConfigSource {
    /// Path of the parent configuration
    pub fn path(&self) -> &Utf8Path {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => path,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Directory the search started from
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Locate and load the parent configuration
    pub async fn load_parent_config(
        &self,
        explicit: Option<&Utf8Path>,
    ) -> ConfigResult<(ParentConfig, ConfigSource)> {
        let source = match explicit {
            Some(path) => ConfigSource::Explicit(self.cwd.join(path)),
            None => ConfigSource::Discovered(self.resolve_config_path(DEFAULT_PARENT_CONFIG)?),
        };

        if !source.path().exists() {
            return Err(MkbError::ConfigValidation {
                field: "config".to_string(),
                reason: format!("No parent configuration found at {}", source.path()),
            });
        }

        let config = crate::cfg::load_parent_config(source.path()).await?;
        Ok((config, source))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Ok(config_path);
            }

            // Move up one directory
            if let Some(parent) = current.parent() {
                current = parent;
            } else {
                // Reached filesystem root
                break;
            }
        }

        // Return path in current directory even if it doesn't exist
        Ok(self.cwd.join(filename))
    }

    /// Load the user's settings file, if present
    pub async fn load_global_settings(&self) -> ConfigResult<Option<GlobalSettings>> {
        let home_dir = dirs::home_dir().ok_or_else(|| MkbError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        let settings_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| MkbError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".mkb")
            .join("config.toml");

        Self::load_global_settings_from(&settings_path).await
    }

    /// Load a settings file, treating a missing file as no settings
    pub async fn load_global_settings_from(
        path: &Utf8Path,
    ) -> ConfigResult<Option<GlobalSettings>> {
        if path.exists() {
            let settings = crate::toml::load_from_file(path).await?;
            debug!(%path, options = settings.options.len(), "loaded settings file");
            Ok(Some(settings))
        } else {
            Ok(None)
        }
    }
}

impl ConfigLayering {
    /// Create a new option layering
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the user settings layer
    pub fn with_global_settings(mut self, settings: Option<GlobalSettings>) -> Self {
        self.global_settings = settings;
        self
    }

    /// Add the part section layer
    pub fn with_part_options(mut self, options: Option<Section>) -> Self {
        self.part_options = options;
        self
    }

    /// Add environment variable overrides
    pub fn with_env_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    /// Add command line overrides
    pub fn with_cli_overrides(mut self, overrides: Vec<(String, String)>) -> Self {
        self.cli_overrides = overrides;
        self
    }

    /// Merge all layers into a normalized option set
    pub fn build(&self) -> ConfigResult<OptionSet> {
        Self::merge_options(
            self.global_settings.as_ref(),
            self.part_options.as_ref(),
            &self.env_overrides,
            &self.cli_overrides,
        )
    }

    /// Merge defaults < settings file < part section < environment < CLI,
    /// then fold append fragments
    pub fn merge_options(
        global_settings: Option<&GlobalSettings>,
        part_options: Option<&Section>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &[(String, String)],
    ) -> ConfigResult<OptionSet> {
        let mut merged = OptionSet::with_defaults();

        // Apply site-wide settings (if present)
        if let Some(settings) = global_settings {
            merged.merge(settings.option_set());
        }

        // Apply the part section as the parent build hands it over
        if let Some(section) = part_options {
            for (name, value) in section {
                merged.insert(name, value.clone());
            }
        }

        Self::apply_env_overrides(&mut merged, env_overrides);

        // Apply CLI flag overrides (highest priority)
        for (name, value) in cli_overrides {
            merged.insert(name, value.clone());
        }

        merged.normalize()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(options: &mut OptionSet, overrides: &HashMap<String, String>) {
        for (key, value) in overrides {
            if let Some(option) = option_for_env_var(key) {
                options.insert(option.as_str(), value.clone());
            }
        }
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

/// Recognized option behind an `MKB_*` variable name
pub fn option_for_env_var(key: &str) -> Option<OptionKey> {
    let name = key.strip_prefix(ENV_PREFIX)?.to_lowercase();
    OptionKey::from_name(&name)
}

/// Parse a `--set name=value` argument
pub fn parse_override(raw: &str) -> ConfigResult<(String, String)> {
    let (name, value) = raw.split_once('=').ok_or_else(|| MkbError::ConfigValidation {
        field: "--set".to_string(),
        reason: format!("expected name=value, got '{}'", raw),
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(MkbError::ConfigValidation {
            field: "--set".to_string(),
            reason: format!("missing option name in '{}'", raw),
        });
    }

    // Literal "\n" lets list options be given on one command line
    Ok((name.to_string(), value.replace("\\n", "\n")))
}
