//! `${section:option}` substitution.
//!
//! `$$` stands for a literal `$`. A part section without its own `location`
//! resolves `${part:location}` to `${buildout:parts-directory}/<part>`.

use mkb_core::error::MkbError;
use mkb_core::types::{Section, BUILDOUT_SECTION};

use super::parser::RawSections;
use crate::ConfigResult;

/// Expand every reference in every option value
pub fn substitute(sections: &RawSections) -> ConfigResult<RawSections> {
    let mut resolved = RawSections::new();

    for (name, options) in sections {
        let mut section = Section::new();
        for key in options.keys() {
            let mut stack = Vec::new();
            let value = resolve_option(sections, name, key, &mut stack)?;
            section.insert(key.clone(), value);
        }
        resolved.insert(name.clone(), section);
    }

    Ok(resolved)
}

fn resolve_option(
    sections: &RawSections,
    section: &str,
    option: &str,
    stack: &mut Vec<(String, String)>,
) -> ConfigResult<String> {
    let options = sections
        .get(section)
        .ok_or_else(|| MkbError::UnknownSection {
            section: section.to_string(),
        })?;
    let raw = match options.get(option) {
        Some(raw) => raw.clone(),
        None if option == "location" && section != BUILDOUT_SECTION => {
            format!("${{buildout:parts-directory}}/{}", section)
        }
        None => {
            return Err(MkbError::MissingOption {
                section: section.to_string(),
                option: option.to_string(),
            })
        }
    };

    let frame = (section.to_string(), option.to_string());
    if stack.contains(&frame) {
        let cycle: Vec<String> = stack
            .iter()
            .map(|(s, o)| format!("{}:{}", s, o))
            .collect();
        return Err(MkbError::ConfigValidation {
            field: format!("{}:{}", section, option),
            reason: format!("circular reference through {}", cycle.join(" -> ")),
        });
    }

    stack.push(frame);
    let value = expand(&raw, sections, section, option, stack)?;
    stack.pop();

    Ok(value)
}

fn expand(
    raw: &str,
    sections: &RawSections,
    section: &str,
    option: &str,
    stack: &mut Vec<(String, String)>,
) -> ConfigResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        let Some(after) = after.strip_prefix('{') else {
            out.push('$');
            rest = after;
            continue;
        };

        let end = after.find('}').ok_or_else(|| MkbError::ConfigValidation {
            field: format!("{}:{}", section, option),
            reason: "unterminated ${...} reference".to_string(),
        })?;

        let reference = &after[..end];
        let (ref_section, ref_option) =
            reference
                .split_once(':')
                .ok_or_else(|| MkbError::ConfigValidation {
                    field: format!("{}:{}", section, option),
                    reason: format!("reference '${{{}}}' must be section:option", reference),
                })?;

        let ref_section = if ref_section.is_empty() {
            section
        } else {
            ref_section
        };

        out.push_str(&resolve_option(sections, ref_section, ref_option, stack)?);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
