//! Terminal color support.
//!
//! Colors are off when NO_COLOR is set or when stdout or stderr is not a
//! terminal.

use std::env;
use std::io::{self, IsTerminal};

const RESET: &str = "\x1b[0m";

/// Color support detection and formatting
#[derive(Debug, Clone, Copy)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support from the terminal and NO_COLOR
    pub fn detect() -> Self {
        if env::var_os("NO_COLOR").is_some() {
            return Self::disabled();
        }
        Self {
            enabled: io::stderr().is_terminal() && io::stdout().is_terminal(),
        }
    }

    /// Force disable colors
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Format text in green
    pub fn green(&self, text: &str) -> String {
        self.paint("\x1b[32m", text)
    }

    /// Format text in yellow
    pub fn yellow(&self, text: &str) -> String {
        self.paint("\x1b[33m", text)
    }

    /// Format text in red
    pub fn red(&self, text: &str) -> String {
        self.paint("\x1b[31m", text)
    }

    /// Format text as dim/gray
    pub fn dim(&self, text: &str) -> String {
        self.paint("\x1b[2m", text)
    }

    /// Format text in bold
    pub fn bold(&self, text: &str) -> String {
        self.paint("\x1b[1m", text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }
}
