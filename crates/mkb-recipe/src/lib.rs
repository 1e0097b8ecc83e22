//! # mkb-recipe
//!
//! Builds a nested sub-build from a part of a parent build configuration.
//!
//! A [`MakeBuildout`] instance owns one part's options and runs the
//! lifecycle strictly in sequence:
//!
//! - `install`: validate, scaffold, synthesize, bootstrap and build
//! - `update`: validate, bootstrap and build
//!
//! The first fatal error aborts the sequence. Side effects already
//! performed (a renamed config, a scaffolded directory) are left in place.

pub mod eggs;
pub mod runner;
pub mod synth;
pub mod validate;


use std::fmt;

use camino::Utf8PathBuf;
use mkb_core::error::MkbError;
use mkb_core::types::{OptionSet, ParentConfig, RecipeOptions};
use mkb_core::utils::{sub_build_dir, PathRewriter};
use tracing::{error, info, warn};

pub use eggs::{developed_eggs, RESERVED_EGGS};
pub use runner::{ProcessOutcome, Runner};
pub use synth::Synthesizer;
pub use validate::Validator;

/// Result type for recipe operations
pub type RecipeResult<T> = Result<T, MkbError>;

/// External steps of the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Scaffold,
    Bootstrap,
    Build,
    Test,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Scaffold => "scaffold",
            Step::Bootstrap => "bootstrap",
            Step::Build => "build",
            Step::Test => "test",
        })
    }
}

/// What a lifecycle run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// Configuration file written, if synthesis ran
    pub config_path: Option<Utf8PathBuf>,
    /// Outcome of every external step, in order
    pub steps: Vec<(Step, ProcessOutcome)>,
}

impl LifecycleReport {
    /// Outcome of the first run of `step`
    pub fn outcome(&self, step: Step) -> Option<&ProcessOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }
}

/// One sub-build recipe instance
#[derive(Debug)]
pub struct MakeBuildout {
    name: String,
    options: OptionSet,
    parent: ParentConfig,
    runner: Runner,
    strict: bool,
}

impl MakeBuildout {
    /// Create an instance from a layered option set
    pub fn new(name: impl Into<String>, options: OptionSet, parent: ParentConfig) -> RecipeResult<Self> {
        Ok(Self {
            name: name.into(),
            options: options.normalize()?,
            parent,
            runner: Runner::new(),
            strict: false,
        })
    }

    /// Create an instance from caller overrides on top of the defaults
    pub fn with_defaults(
        name: impl Into<String>,
        overrides: OptionSet,
        parent: ParentConfig,
    ) -> RecipeResult<Self> {
        let mut options = OptionSet::with_defaults();
        options.merge(overrides);
        Self::new(name, options, parent)
    }

    /// Fail on non-zero exit codes of scaffold, bootstrap and build
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Part name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized options
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Parent configuration
    pub fn parent(&self) -> &ParentConfig {
        &self.parent
    }

    /// Directory of the sub-build
    pub fn sub_build_dir(&self) -> RecipeResult<Utf8PathBuf> {
        Ok(sub_build_dir(self.parent.parts_directory()?, &self.name))
    }

    /// Check options against the environment and the parent config
    pub async fn validate(&self) -> RecipeResult<RecipeOptions> {
        Validator::new(&self.name, &self.parent, &self.runner)
            .validate(&self.options)
            .await
    }

    /// Text the sub-build configuration would contain
    pub fn render(&self, options: &RecipeOptions) -> RecipeResult<String> {
        let eggs = developed_eggs(&self.parent);
        let rewriter = PathRewriter::for_part(&self.parent, &self.name)?;
        Synthesizer::new(options, &self.parent, &eggs, &rewriter).render()
    }

    /// Write the sub-build configuration
    pub async fn synthesize(&self, options: &RecipeOptions) -> RecipeResult<Utf8PathBuf> {
        let eggs = developed_eggs(&self.parent);
        let rewriter = PathRewriter::for_part(&self.parent, &self.name)?;
        let sub_build = self.sub_build_dir()?;
        Synthesizer::new(options, &self.parent, &eggs, &rewriter)
            .write(&sub_build)
            .await
    }

    /// Validate, scaffold, synthesize, then bootstrap and build
    pub async fn install(&self) -> RecipeResult<LifecycleReport> {
        info!(part = %self.name, "installing sub-build");
        let options = self.validate().await?;
        let mut report = LifecycleReport::default();

        let parts_directory = Utf8PathBuf::from(self.parent.parts_directory()?);
        let outcome = self
            .runner
            .create(
                &parts_directory,
                &options.paster,
                &options.template,
                &self.name,
                &options.paster_commands,
            )
            .await?;
        self.settle(&mut report, Step::Scaffold, &options.paster, outcome)?;

        report.config_path = Some(self.synthesize(&options).await?);

        self.bootstrap_and_build(&options, &mut report).await?;
        Ok(report)
    }

    /// Validate, then bootstrap and build; no scaffolding or synthesis
    pub async fn update(&self) -> RecipeResult<LifecycleReport> {
        info!(part = %self.name, "updating sub-build");
        let options = self.validate().await?;
        let mut report = LifecycleReport::default();

        self.bootstrap_and_build(&options, &mut report).await?;
        Ok(report)
    }

    /// Bootstrap if needed, then run the configured test runner
    pub async fn test(&self, args: &[String]) -> RecipeResult<LifecycleReport> {
        let options = self.validate().await?;
        let test_runner = options
            .test_runner
            .clone()
            .ok_or_else(|| MkbError::ConfigValidation {
                field: "test_runner".to_string(),
                reason: format!("no test runner configured for part [{}]", self.name),
            })?;

        let sub_build = self.sub_build_dir()?;
        let mut report = LifecycleReport::default();

        let outcome = self
            .runner
            .bootstrap_if_needed(&sub_build, &options.python)
            .await;
        self.settle(&mut report, Step::Bootstrap, &options.python, outcome)?;

        info!(part = %self.name, "running tests with bin/{}", test_runner);
        let outcome = self.runner.run_tests(&sub_build, &test_runner, args).await;
        // Test failures are the point of running tests: always reported
        if !outcome.is_success() {
            return Err(MkbError::Subprocess {
                program: test_runner,
                reason: outcome.to_string(),
            });
        }
        report.steps.push((Step::Test, outcome));
        Ok(report)
    }

    async fn bootstrap_and_build(
        &self,
        options: &RecipeOptions,
        report: &mut LifecycleReport,
    ) -> RecipeResult<()> {
        let sub_build = self.sub_build_dir()?;

        let outcome = self
            .runner
            .bootstrap_if_needed(&sub_build, &options.python)
            .await;
        self.settle(report, Step::Bootstrap, &options.python, outcome)?;

        let outcome = self.runner.build(&sub_build).await;
        let program = runner::build_runner(&sub_build);
        self.settle(report, Step::Build, program.as_str(), outcome)
    }

    /// Log a step outcome; in strict mode a failed step aborts
    fn settle(
        &self,
        report: &mut LifecycleReport,
        step: Step,
        program: &str,
        outcome: ProcessOutcome,
    ) -> RecipeResult<()> {
        match &outcome {
            ProcessOutcome::Exited { code: Some(0) } => info!(part = %self.name, "{} finished", step),
            ProcessOutcome::Skipped => info!(part = %self.name, "{} skipped", step),
            ProcessOutcome::Exited { .. } => {
                warn!(part = %self.name, "{} step '{}' ended with {}", step, program, outcome)
            }
            ProcessOutcome::LaunchFailed { message } => {
                error!(part = %self.name, "{} step could not start '{}': {}", step, program, message)
            }
        }

        let failed = !outcome.is_success();
        let reason = outcome.to_string();
        report.steps.push((step, outcome));

        if self.strict && failed {
            return Err(MkbError::Subprocess {
                program: program.to_string(),
                reason,
            });
        }
        Ok(())
    }
}
