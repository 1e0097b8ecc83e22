//! Command implementations and dispatch logic.
//!
//! Every command that works on a part goes through
//! [`CommandContext::load_recipe`], which layers the part's options and
//! builds the recipe instance.

use camino::Utf8PathBuf;
use mkb_config::{parse_override, ConfigLayering, ConfigLoader, GlobalSettings};
use mkb_core::error::{MkbError, MkbResult};
use mkb_recipe::{LifecycleReport, MakeBuildout};
use tracing::info;

pub mod check;
pub mod install;
pub mod render;
pub mod update;

#[cfg(test)]
mod tests;

use crate::{output::OutputHandler, Commands};

/// Command names, for typo suggestions
const COMMAND_NAMES: [&str; 7] = [
    "install", "update", "check", "render", "test", "version", "help",
];

/// Global flags that shape how a part's options are assembled
#[derive(Debug, Clone, Default)]
pub struct RecipeArgs {
    pub config: Option<Utf8PathBuf>,
    pub set: Vec<String>,
    pub strict: bool,
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub args: RecipeArgs,
    pub settings: Option<GlobalSettings>,
}

impl CommandContext {
    /// Create a command context
    pub fn new(cwd: Utf8PathBuf, args: RecipeArgs, settings: Option<GlobalSettings>) -> Self {
        Self {
            cwd,
            output: OutputHandler::new(),
            args,
            settings,
        }
    }

    /// Load the parent configuration and build the recipe instance for `part`
    pub async fn load_recipe(&self, part: &str) -> MkbResult<MakeBuildout> {
        let loader = ConfigLoader::new(self.cwd.clone());
        let (parent, source) = loader.load_parent_config(self.args.config.as_deref()).await?;
        info!(part, config = %source.path(), "loaded parent configuration");

        let section = parent
            .section(part)
            .cloned()
            .ok_or_else(|| MkbError::UnknownSection {
                section: part.to_string(),
            })?;

        let cli_overrides = self
            .args
            .set
            .iter()
            .map(|raw| parse_override(raw))
            .collect::<MkbResult<Vec<_>>>()?;

        let options = ConfigLayering::new()
            .with_global_settings(self.settings.clone())
            .with_part_options(Some(section))
            .with_env_overrides(ConfigLayering::collect_env_overrides())
            .with_cli_overrides(cli_overrides)
            .build()?;

        Ok(MakeBuildout::new(part, options, parent)?.strict(self.args.strict))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> MkbResult<()> {
    match command {
        Commands::Install { part } => install::execute(&part, ctx).await,
        Commands::Update { part } => update::execute(&part, ctx).await,
        Commands::Check { part } => check::execute(&part, ctx).await,
        Commands::Render { part } => render::execute(&part, ctx).await,
        Commands::Test { part, args } => test::execute(&part, &args, ctx).await,
        Commands::Version => show_version(ctx).await,
        Commands::External(args) => unknown_command(&args, ctx),
    }
}

fn unknown_command(args: &[String], ctx: &CommandContext) -> MkbResult<()> {
    let name = args.first().map(String::as_str).unwrap_or("");
    ctx.output.error(&format!("Unknown command '{}'", name));
    if let Some(suggestion) = suggest_similar_command(name) {
        ctx.output.info(&format!("Did you mean '{}'?", suggestion));
    }
    ctx.output.info("Run 'mkb help' to see available commands.");

    Err(MkbError::ConfigValidation {
        field: "command".to_string(),
        reason: format!("Unknown command: {}", name),
    })
}

/// Print the step outcomes of a lifecycle run
pub fn report_steps(report: &LifecycleReport, ctx: &CommandContext) {
    for (step, outcome) in &report.steps {
        if outcome.is_success() {
            ctx.output.success(&format!("{}: {}", step, outcome));
        } else {
            ctx.output.warn(&format!("{}: {}", step, outcome));
        }
    }
}

/// Show help information
pub async fn show_help(ctx: &CommandContext) -> MkbResult<()> {
    ctx.output.info("mkb - generate and build nested sub-builds");
    ctx.output.info("");
    ctx.output.info("Usage: mkb [OPTIONS] <COMMAND> <PART>");
    ctx.output.info("");
    ctx.output.info("Lifecycle:");
    ctx.output.info("  install <part>   Scaffold, configure, bootstrap and build");
    ctx.output.info("  update <part>    Bootstrap and rebuild");
    ctx.output.info("  test <part>      Run the sub-build's test runner");
    ctx.output.info("");
    ctx.output.info("Inspection:");
    ctx.output.info("  check <part>     Validate options");
    ctx.output.info("  render <part>    Print the generated configuration");
    ctx.output.info("  version          Show version information");
    ctx.output.info("");
    ctx.output.info("Options:");
    ctx.output.info("  -c, --config <PATH>    Parent configuration");
    ctx.output.info("  --set <NAME=VALUE>     Override a recipe option");
    ctx.output.info("  --strict               Fail on non-zero exit codes");
    ctx.output.info("  -v, --verbose          Verbose logging");
    Ok(())
}

/// Show version and build information
pub async fn show_version(ctx: &CommandContext) -> MkbResult<()> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.info(&format!("mkb v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.info(&format!("Built: {}", env!("MKB_BUILD_DATE")));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("MKB_RUSTC_VERSION")));

    Ok(())
}

/// Suggest a command within edit distance 2
pub fn suggest_similar_command(input: &str) -> Option<&'static str> {
    COMMAND_NAMES
        .iter()
        .map(|&command| (command, edit_distance(input, command)))
        .filter(|&(_, distance)| distance <= 2)
        .min_by_key(|&(_, distance)| distance)
        .map(|(command, _)| command)
}

/// Levenshtein distance between two strings
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
