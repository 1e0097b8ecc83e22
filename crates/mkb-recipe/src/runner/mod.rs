//! Subprocess invocation for the scaffolding tool and the nested build.
//!
//! Every call is awaited to completion before returning. Exit codes are
//! reported through [`ProcessOutcome`] and never turned into errors here;
//! the lifecycle decides whether a failed step matters.

use std::fmt;
use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use mkb_core::error::MkbError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::RecipeResult;

/// Script created by bootstrapping; also the nested build runner
pub const BUILD_RUNNER: &str = "bin/buildout";

/// Bootstrap script shipped by the scaffolding template
pub const BOOTSTRAP_SCRIPT: &str = "bootstrap.py";

/// Result of one external step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran; `code` is `None` when killed by a signal
    Exited { code: Option<i32> },
    /// The process could not be started
    LaunchFailed { message: String },
    /// Nothing needed to run
    Skipped,
}

impl ProcessOutcome {
    /// Whether the step exited with code 0 or was skipped
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ProcessOutcome::Exited { code: Some(0) } | ProcessOutcome::Skipped
        )
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessOutcome::Exited { code: Some(code) } => write!(f, "exit code {}", code),
            ProcessOutcome::Exited { code: None } => f.write_str("terminated by signal"),
            ProcessOutcome::LaunchFailed { message } => write!(f, "launch failed: {}", message),
            ProcessOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// Runs external programs on behalf of a recipe instance.
///
/// Working directories are passed explicitly to each child process; the
/// current directory of this process is never changed.
#[derive(Debug, Clone, Default)]
pub struct Runner;

impl Runner {
    /// Create a runner
    pub fn new() -> Self {
        Self
    }

    /// Run a program and return its stdout followed by its stderr
    pub async fn capture(&self, program: &str, args: &[&str]) -> std::io::Result<String> {
        debug!(program, ?args, "capturing command output");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    /// `<paster> create -t <template> <name>` inside the parts directory,
    /// fed `commands` on stdin with every `''` removed
    pub async fn create(
        &self,
        parts_directory: &Utf8Path,
        paster: &str,
        template: &str,
        name: &str,
        commands: &str,
    ) -> RecipeResult<ProcessOutcome> {
        tokio::fs::create_dir_all(parts_directory)
            .await
            .map_err(|e| {
                MkbError::io(
                    format!("Failed to create parts directory: {}", parts_directory),
                    e,
                )
            })?;

        let mut command = Command::new(paster);
        command
            .args(["create", "-t", template, name])
            .current_dir(parts_directory)
            .stdin(Stdio::piped());

        Ok(run_with_input(command, &scaffold_input(commands)).await)
    }

    /// `<python> bootstrap.py` unless the sub-build is already bootstrapped
    pub async fn bootstrap_if_needed(&self, sub_build: &Utf8Path, python: &str) -> ProcessOutcome {
        if is_bootstrapped(sub_build) {
            debug!(%sub_build, "already bootstrapped");
            return ProcessOutcome::Skipped;
        }

        let mut command = Command::new(python);
        command.arg(BOOTSTRAP_SCRIPT).current_dir(sub_build);
        run(command).await
    }

    /// The nested build runner
    pub async fn build(&self, sub_build: &Utf8Path) -> ProcessOutcome {
        let mut command = Command::new(build_runner(sub_build));
        command.current_dir(sub_build);
        run(command).await
    }

    /// `bin/<test_runner> [args]` inside the sub-build
    pub async fn run_tests(
        &self,
        sub_build: &Utf8Path,
        test_runner: &str,
        args: &[String],
    ) -> ProcessOutcome {
        let mut command = Command::new(sub_build.join("bin").join(test_runner));
        command.args(args).current_dir(sub_build);
        run(command).await
    }
}

/// Path of the nested build runner
pub fn build_runner(sub_build: &Utf8Path) -> Utf8PathBuf {
    sub_build.join(BUILD_RUNNER)
}

/// Whether the bootstrap artifact exists
pub fn is_bootstrapped(sub_build: &Utf8Path) -> bool {
    build_runner(sub_build).exists()
}

/// Scaffolding answers with empty-string placeholders removed
pub fn scaffold_input(commands: &str) -> String {
    commands.replace("''", "")
}

async fn run(mut command: Command) -> ProcessOutcome {
    debug!(command = ?command.as_std(), "running");
    match command.status().await {
        Ok(status) => ProcessOutcome::Exited {
            code: status.code(),
        },
        Err(e) => ProcessOutcome::LaunchFailed {
            message: e.to_string(),
        },
    }
}

async fn run_with_input(mut command: Command, input: &str) -> ProcessOutcome {
    debug!(command = ?command.as_std(), "running with stdin");
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ProcessOutcome::LaunchFailed {
                message: e.to_string(),
            }
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        // The tool may exit without reading everything
        if let Err(e) = stdin.write_all(input.as_bytes()).await {
            debug!(error = %e, "stdin closed early");
        }
        drop(stdin);
    }

    match child.wait().await {
        Ok(status) => ProcessOutcome::Exited {
            code: status.code(),
        },
        Err(e) => ProcessOutcome::LaunchFailed {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_input_strips_empty_quotes() {
        assert_eq!(scaffold_input("''\nmy.package\n''\n"), "\nmy.package\n\n");
        assert_eq!(scaffold_input("plain"), "plain");
    }

    #[test]
    fn test_outcome_success() {
        assert!(ProcessOutcome::Exited { code: Some(0) }.is_success());
        assert!(ProcessOutcome::Skipped.is_success());
        assert!(!ProcessOutcome::Exited { code: Some(1) }.is_success());
        assert!(!ProcessOutcome::Exited { code: None }.is_success());
        assert!(!ProcessOutcome::LaunchFailed {
            message: "nope".to_string()
        }
        .is_success());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ProcessOutcome::Exited { code: Some(2) }.to_string(), "exit code 2");
        assert_eq!(ProcessOutcome::Skipped.to_string(), "skipped");
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sub_build = Utf8Path::from_path(temp_dir.path()).unwrap();

        let outcome = Runner::new().build(sub_build).await;
        assert!(matches!(outcome, ProcessOutcome::LaunchFailed { .. }));
    }

    #[tokio::test]
    async fn test_capture_missing_program() {
        let result = Runner::new()
            .capture("/nonexistent/definitely-not-here", &["-h"])
            .await;
        assert!(result.is_err());
    }
}
