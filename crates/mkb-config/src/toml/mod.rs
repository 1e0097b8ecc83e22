//! User settings file (`~/.mkb/config.toml`) parsing

use std::collections::BTreeMap;

use camino::Utf8Path;
use mkb_core::error::MkbError;
use mkb_core::types::{OptionKey, OptionSet};
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Site-wide option values, layered under the part section
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    /// Logging preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogSection>,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    /// Default tracing filter directive, e.g. "mkb=debug"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl GlobalSettings {
    /// Option values as an option set
    pub fn option_set(&self) -> OptionSet {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Log filter directive, if configured
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref().and_then(|log| log.filter.as_deref())
    }
}

/// Parse settings text
pub fn parse_settings(content: &str) -> ConfigResult<GlobalSettings> {
    // toml_edit first, for error locations
    if let Err(e) = content.parse::<toml_edit::DocumentMut>() {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        return Err(MkbError::TomlParse {
            message: e.message().to_string(),
            line,
            column,
        });
    }

    let settings: GlobalSettings = toml::from_str(content).map_err(|e| MkbError::TomlParse {
        message: e.message().to_string(),
        line: 0,
        column: 0,
    })?;

    validate_settings(&settings)?;
    Ok(settings)
}

/// Serialize settings to TOML
pub fn serialize_settings(settings: &GlobalSettings) -> ConfigResult<String> {
    toml::to_string_pretty(settings).map_err(|e| MkbError::TomlParse {
        message: format!("TOML serialization error: {}", e),
        line: 0,
        column: 0,
    })
}

/// Only recognized option names may be set site-wide
pub fn validate_settings(settings: &GlobalSettings) -> ConfigResult<()> {
    for name in settings.options.keys() {
        let base = name.trim_end_matches('+').trim_end();
        if OptionKey::from_name(base).is_none() {
            return Err(MkbError::ConfigValidation {
                field: format!("options.{}", name),
                reason: "not a recognized recipe option".to_string(),
            });
        }
    }
    Ok(())
}

/// Load settings from a file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<GlobalSettings> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MkbError::io(format!("Failed to read {}", path), e))?;

    parse_settings(&content).map_err(|e| match e {
        MkbError::ConfigValidation { field, reason } => MkbError::ConfigValidation {
            field,
            reason: format!("in file {}: {}", path, reason),
        },
        other => other,
    })
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml = r#"
[options]
python = "/usr/bin/python2.7"
"extra_eggs+" = "pdbpp"

[log]
filter = "mkb=debug"
"#;
        let settings = parse_settings(toml).unwrap();
        assert_eq!(settings.options["python"], "/usr/bin/python2.7");
        assert_eq!(settings.log_filter(), Some("mkb=debug"));

        let options = settings.option_set();
        assert_eq!(options.get("extra_eggs+"), Some("pdbpp"));
    }

    #[test]
    fn test_empty_settings() {
        let settings = parse_settings("").unwrap();
        assert!(settings.options.is_empty());
        assert_eq!(settings.log_filter(), None);
    }

    #[test]
    fn test_syntax_error_has_location() {
        let err = parse_settings("[options]\npython = \n").unwrap_err();
        match err {
            MkbError::TomlParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = parse_settings("[options]\npyhton = \"x\"\n").unwrap_err();
        assert!(matches!(err, MkbError::ConfigValidation { .. }));
    }

    #[test]
    fn test_round_trip_serialization() {
        let settings = parse_settings("[options]\ntemplate = \"plone3_buildout\"\n").unwrap();
        let serialized = serialize_settings(&settings).unwrap();
        assert_eq!(parse_settings(&serialized).unwrap(), settings);
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
        assert_eq!(line_column("ab", 0), (1, 1));
    }
}
