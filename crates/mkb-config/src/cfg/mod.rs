//! Parent configuration loading.
//!
//! Reads a `buildout.cfg` style file, follows `[buildout] extends`, applies
//! `+=`/`-=` fragments against the extended values, injects the standard
//! `[buildout]` directories and expands `${section:option}` references.

pub mod interpolate;
pub mod parser;

use std::future::Future;
use std::pin::Pin;

use camino::{Utf8Path, Utf8PathBuf};
use mkb_core::error::MkbError;
use mkb_core::types::{split_lines, ParentConfig, Section, APPEND_MARKER, BUILDOUT_SECTION};

use tracing::debug;

use crate::ConfigResult;
pub use interpolate::substitute;
pub use parser::{parse_cfg, RawSections, REMOVE_MARKER};

/// `[buildout]` directories every build has, with their defaults
const DIRECTORY_DEFAULTS: [(&str, &str); 4] = [
    ("parts-directory", "${buildout:directory}/parts"),
    ("eggs-directory", "${buildout:directory}/eggs"),
    ("develop-eggs-directory", "${buildout:directory}/develop-eggs"),
    ("bin-directory", "${buildout:directory}/bin"),
];

/// Load and fully resolve a parent configuration file
pub async fn load_parent_config(path: &Utf8Path) -> ConfigResult<ParentConfig> {
    let mut stack = Vec::new();
    let mut sections = load_with_extends(path.to_path_buf(), &mut stack).await?;

    inject_defaults(&mut sections, path);

    Ok(ParentConfig::from_sections(substitute(&sections)?))
}

/// Parse configuration text with no file behind it (no extends support)
pub fn parent_config_from_str(content: &str, directory: &Utf8Path) -> ConfigResult<ParentConfig> {
    let mut sections = parse_cfg(content, "<memory>")?;
    inject_defaults(&mut sections, &directory.join("buildout.cfg"));

    Ok(ParentConfig::from_sections(substitute(&sections)?))
}

fn load_with_extends<'a>(
    path: Utf8PathBuf,
    stack: &'a mut Vec<Utf8PathBuf>,
) -> Pin<Box<dyn Future<Output = ConfigResult<RawSections>> + Send + 'a>> {
    Box::pin(async move {
        if stack.contains(&path) {
            return Err(MkbError::ConfigValidation {
                field: "extends".to_string(),
                reason: format!("{} extends itself", path),
            });
        }

        debug!(%path, depth = stack.len(), "reading configuration");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MkbError::io(format!("Failed to read {}", path), e))?;
        let own = parse_cfg(&content, path.as_str())?;

        let bases = own
            .get(BUILDOUT_SECTION)
            .and_then(|buildout| buildout.get("extends"))
            .map(|extends| extends.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        if bases.is_empty() {
            return Ok(own);
        }

        let base_dir = path.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
        stack.push(path);

        let mut merged = RawSections::new();
        for base in bases {
            let base_path = base_dir.join(&base);
            let base_sections = load_with_extends(base_path, &mut *stack).await?;
            overlay(&mut merged, base_sections);
        }
        stack.pop();

        overlay(&mut merged, own);
        Ok(merged)
    })
}

/// Apply `overlay` on top of `base`, resolving add/remove fragments
pub fn overlay(base: &mut RawSections, overlay: RawSections) {
    for (name, options) in overlay {
        let target = base.entry(name).or_default();
        for (key, value) in options {
            apply_option(target, key, value);
        }
    }
}

fn apply_option(target: &mut Section, key: String, value: String) {
    if let Some(name) = key.strip_suffix(APPEND_MARKER) {
        if let Some(existing) = target.get_mut(name) {
            for line in split_lines(&value) {
                existing.push('\n');
                existing.push_str(&line);
            }
            return;
        }
    } else if let Some(name) = key.strip_suffix(REMOVE_MARKER) {
        if let Some(existing) = target.get_mut(name) {
            let removed = split_lines(&value);
            let kept: Vec<&str> = existing
                .split('\n')
                .filter(|line| !removed.iter().any(|r| r == line.trim()))
                .collect();
            *existing = kept.join("\n");
            return;
        }
    }
    target.insert(key, value);
}

fn inject_defaults(sections: &mut RawSections, path: &Utf8Path) {
    let directory = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_string(),
        _ => ".".to_string(),
    };

    let buildout = sections.entry(BUILDOUT_SECTION.to_string()).or_default();
    buildout
        .entry("directory".to_string())
        .or_insert(directory);
    for (option, default) in DIRECTORY_DEFAULTS {
        let value = buildout
            .entry(option.to_string())
            .or_insert_with(|| default.to_string());
        // Relative directories are relative to the build root
        if !value.starts_with('$') && Utf8Path::new(value.as_str()).is_relative() {
            *value = format!("${{buildout:directory}}/{}", value);
        }
    }
}
