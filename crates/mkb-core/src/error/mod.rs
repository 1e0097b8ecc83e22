//! Error types and result aliases for mkb operations.
//!
//! Provides a unified error type covering configuration loading, option
//! validation, sub-build synthesis and subprocess handling, with actionable
//! error messages.

use thiserror::Error;

/// Unified error type for all mkb operations
#[derive(Error, Debug)]
pub enum MkbError {
    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}")]
    CfgParse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Failed to parse settings file: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Section [{section}] not found in parent configuration")]
    UnknownSection { section: String },

    #[error("Option '{option}' is missing from section [{section}]")]
    MissingOption { section: String, option: String },

    // Validation errors
    #[error("Option '{option}' failed validation: {reason}")]
    Validation { option: String, reason: String },

    #[error("Template '{template}' unknown to the scaffolding tool")]
    TemplateNotFound {
        template: String,
        #[source]
        source: Box<MkbError>,
    },

    // Subprocess errors
    #[error("Command '{program}' did not complete successfully: {reason}")]
    Subprocess { program: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for mkb operations
pub type MkbResult<T> = Result<T, MkbError>;

impl MkbError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a validation error for an option
    pub fn validation(option: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a fatal option validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MkbError::Validation { .. } | MkbError::TemplateNotFound { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            MkbError::Validation { .. } => {
                Some("Check that the interpreter and scaffolding tool paths point at working executables")
            },
            MkbError::TemplateNotFound { .. } => {
                Some("Run '<paster> create --list-template' to see the installed templates")
            },
            MkbError::UnknownSection { .. } => {
                Some("Check the part name against the sections of the parent configuration")
            },
            MkbError::CfgParse { .. } => {
                Some("Continuation lines must be indented and every option must follow a [section] header")
            },
            MkbError::Subprocess { .. } => {
                Some("Check the command output above; without --strict only the test runner fails on exit codes")
            },
            _ => None,
        }
    }
}
