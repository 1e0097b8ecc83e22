//! Error message formatting with actionable suggestions.

use std::error::Error;

use mkb_core::error::MkbError;

use super::colors::ColorSupport;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a formatter with detected color support
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    /// Create a formatter with explicit color support
    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Error message, source location, suggestion and cause chain
    pub fn format_error(&self, error: &MkbError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        if let MkbError::CfgParse { file, line, .. } = error {
            output.push_str(&self.format_location(file, *line));
            output.push('\n');
        }

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&format!("{}: {}\n", self.colors.dim("help"), suggestion));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("{}: {}\n", self.colors.dim("caused by"), err));
            source = err.source();
        }

        output
    }

    /// `--> file:line`
    pub fn format_location(&self, file: &str, line: usize) -> String {
        format!("  {} {}:{}", self.colors.dim("-->"), file, line)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_parse_error_has_location_and_help() {
        let err = MkbError::CfgParse {
            file: "buildout.cfg".to_string(),
            line: 3,
            message: "option outside of a section".to_string(),
        };
        let text = formatter().format_error(&err);

        assert!(text.starts_with("error: Failed to parse buildout.cfg"));
        assert!(text.contains("  --> buildout.cfg:3\n"));
        assert!(text.contains("\nhelp: "));
    }

    #[test]
    fn test_template_error_shows_cause() {
        let err = MkbError::TemplateNotFound {
            template: "plone".to_string(),
            source: Box::new(MkbError::validation("template", "banner not found")),
        };
        let text = formatter().format_error(&err);

        assert!(text.contains("caused by: Option 'template' failed validation: banner not found\n"));
    }
}
