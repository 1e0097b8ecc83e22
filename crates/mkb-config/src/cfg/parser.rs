//! Line parser for the buildout INI dialect.

use indexmap::IndexMap;
use mkb_core::error::MkbError;
use mkb_core::types::{Section, APPEND_MARKER};

use crate::ConfigResult;

/// Marker recorded for `key -= value` assignments
pub const REMOVE_MARKER: char = '-';

/// Sections of a single file before extends/substitution
pub type RawSections = IndexMap<String, Section>;

/// Parse one configuration file.
///
/// `key += value` and `key -= value` are stored under `key+` and `key-`.
/// Indented lines continue the previous value; a value that starts on the
/// following line keeps a leading newline.
pub fn parse_cfg(content: &str, file: &str) -> ConfigResult<RawSections> {
    let mut sections = RawSections::new();
    let mut current: Option<String> = None;
    let mut last_key: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = line.starts_with(|c: char| c == ' ' || c == '\t');

        if indented {
            let (section, key) = match (&current, &last_key) {
                (Some(section), Some(key)) => (section, key),
                _ => {
                    return Err(parse_error(file, line_no, "continuation line without an option"))
                }
            };
            if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }

        if trimmed.starts_with('[') {
            let name = parse_section_header(trimmed)
                .ok_or_else(|| parse_error(file, line_no, "malformed section header"))?;
            sections.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            last_key = None;
            continue;
        }

        let section = current
            .as_ref()
            .ok_or_else(|| parse_error(file, line_no, "option outside of any [section]"))?;

        let (key, value) = split_assignment(trimmed)
            .ok_or_else(|| parse_error(file, line_no, "expected 'option = value'"))?;

        if let Some(options) = sections.get_mut(section) {
            options.insert(key.clone(), value.to_string());
        }
        last_key = Some(key);
    }

    Ok(sections)
}

/// Name inside `[name]`, allowing a trailing comment
fn parse_section_header(line: &str) -> Option<&str> {
    let close = line.find(']')?;
    let rest = line[close + 1..].trim();
    if !rest.is_empty() && !rest.starts_with('#') && !rest.starts_with(';') {
        return None;
    }
    let name = line[1..close].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Split `key = value` / `key: value`, folding `+=` and `-=` into the key
fn split_assignment(line: &str) -> Option<(String, &str)> {
    let separator = line.find(|c: char| c == '=' || c == ':')?;
    let raw_key = line[..separator].trim();
    let value = line[separator + 1..].trim();

    let key = match raw_key.chars().last() {
        Some(marker @ (APPEND_MARKER | REMOVE_MARKER)) if line[separator..].starts_with('=') => {
            let base = raw_key[..raw_key.len() - 1].trim_end();
            if base.is_empty() {
                return None;
            }
            format!("{}{}", base, marker)
        }
        _ => raw_key.to_string(),
    };

    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_error(file: &str, line: usize, message: &str) -> MkbError {
    MkbError::CfgParse {
        file: file.to_string(),
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_options() {
        let content = r#"
# leading comment
[buildout]
parts = sub
develop =
    src/mod1
    src/mod2

[sub]
recipe: zest.recipe.mk_buildout
extra_eggs += pkg1
"#;
        let sections = parse_cfg(content, "buildout.cfg").unwrap();

        let buildout = &sections["buildout"];
        assert_eq!(buildout["parts"], "sub");
        assert_eq!(buildout["develop"], "\nsrc/mod1\nsrc/mod2");

        let sub = &sections["sub"];
        assert_eq!(sub["recipe"], "zest.recipe.mk_buildout");
        assert_eq!(sub["extra_eggs+"], "pkg1");
    }

    #[test]
    fn test_value_with_colon_after_equals() {
        let sections = parse_cfg("[a]\npath = ${buildout:directory}/x\n", "t.cfg").unwrap();
        assert_eq!(sections["a"]["path"], "${buildout:directory}/x");
    }

    #[test]
    fn test_remove_marker() {
        let sections = parse_cfg("[a]\neggs -= old\n", "t.cfg").unwrap();
        assert_eq!(sections["a"]["eggs-"], "old");
    }

    #[test]
    fn test_option_outside_section() {
        let err = parse_cfg("key = value\n", "t.cfg").unwrap_err();
        assert!(matches!(err, MkbError::CfgParse { line: 1, .. }));
    }

    #[test]
    fn test_orphan_continuation_line() {
        let err = parse_cfg("[a]\n  dangling\n", "t.cfg").unwrap_err();
        assert!(matches!(err, MkbError::CfgParse { line: 2, .. }));
    }

    #[test]
    fn test_malformed_header() {
        assert!(parse_cfg("[]\n", "t.cfg").is_err());
        assert!(parse_cfg("[a] junk\n", "t.cfg").is_err());
        assert!(parse_cfg("[a] # fine\n", "t.cfg").is_ok());
    }

    #[test]
    fn test_repeated_section_merges() {
        let sections = parse_cfg("[a]\nx = 1\n[b]\n[a]\ny = 2\n", "t.cfg").unwrap();
        assert_eq!(sections["a"].len(), 2);
        assert_eq!(sections.get_index(0).map(|(name, _)| name.as_str()), Some("a"));
    }
}
