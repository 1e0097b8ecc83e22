//! Option validation against the environment and the parent configuration.

use mkb_core::error::MkbError;
use mkb_core::types::{split_lines, OptionKey, OptionSet, ParentConfig, RecipeOptions};
use tracing::{error, info};

use crate::runner::Runner;
use crate::RecipeResult;

/// Expected in the interpreter's `-h` output
pub const PYTHON_BANNER: &str = "[option] ... [-c cmd | -m mod | file | -] [arg] ...";

/// Expected in the scaffolding tool's usage output
pub const PASTER_BANNER: &str = "paster [paster_options] COMMAND [command_options]";

/// Checks one recipe instance's options
pub struct Validator<'a> {
    name: &'a str,
    parent: &'a ParentConfig,
    runner: &'a Runner,
}

impl<'a> Validator<'a> {
    /// Create a validator for the part `name`
    pub fn new(name: &'a str, parent: &'a ParentConfig, runner: &'a Runner) -> Self {
        Self {
            name,
            parent,
            runner,
        }
    }

    /// Check every recognized option and build the typed view.
    ///
    /// Unrecognized options are logged and skipped. Extra parts missing
    /// from the parent configuration are logged and dropped.
    pub async fn validate(&self, options: &OptionSet) -> RecipeResult<RecipeOptions> {
        let mut typed = RecipeOptions::from_option_set(options);

        for (option, value) in options {
            let Some(key) = OptionKey::from_name(option) else {
                info!(part = %self.name, "option {} is not recognized", option);
                continue;
            };

            match key {
                OptionKey::Python => {
                    self.check_command_line(key, &[value.trim(), "-h"], PYTHON_BANNER)
                        .await?;
                }
                OptionKey::Paster => {
                    self.check_command_line(key, &[value.trim()], PASTER_BANNER)
                        .await?;
                }
                OptionKey::Template => {
                    self.check_template(&typed.paster, value.trim()).await?;
                }
                OptionKey::ExtraParts => {
                    typed.extra_parts = self.filter_extra_parts(value);
                }
                _ => {}
            }
        }

        Ok(typed)
    }

    /// Keep the extra parts the parent configuration declares
    pub fn filter_extra_parts(&self, value: &str) -> Vec<String> {
        split_lines(value)
            .into_iter()
            .filter(|part| {
                let known = self.parent.contains_section(part);
                if !known {
                    error!(part = %self.name, "part {} is not defined in the parent configuration", part);
                }
                known
            })
            .collect()
    }

    async fn check_template(&self, paster: &str, template: &str) -> RecipeResult<()> {
        let expected = format!("  {}:", template);
        self.check_command_line(
            OptionKey::Template,
            &[paster, "create", "--list-template"],
            &expected,
        )
        .await
        .map_err(|e| {
            error!(part = %self.name, "template \"{}\" unknown in paster", template);
            MkbError::TemplateNotFound {
                template: template.to_string(),
                source: Box::new(e),
            }
        })
    }

    async fn check_command_line(
        &self,
        key: OptionKey,
        command: &[&str],
        expected: &str,
    ) -> RecipeResult<()> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| MkbError::validation(key.as_str(), "empty command"))?;
        let joined = command.join(" ");

        let output = self.runner.capture(program, args).await.map_err(|e| {
            error!(part = %self.name, "command \"{}\" is not valid", program);
            MkbError::validation(key.as_str(), format!("cannot run '{}': {}", program, e))
        })?;

        if !output.contains(expected) {
            error!(part = %self.name, "expected output from \"{}\" not found", joined);
            error!(part = %self.name, "expected: {}", expected);
            error!(part = %self.name, "found: {}", output);
            return Err(MkbError::validation(
                key.as_str(),
                format!("output of '{}' does not contain '{}'", joined, expected),
            ));
        }

        Ok(())
    }
}
