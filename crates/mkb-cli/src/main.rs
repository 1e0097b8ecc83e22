//! # mkb
//!
//! Generates a nested sub-build from one part of a parent build
//! configuration, then scaffolds, bootstraps and builds it.
//!
//! This is the entry point: it parses the command line, sets up logging and
//! panic reporting, and dispatches to the command handlers.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use mkb_config::{ConfigLoader, GlobalSettings};
use mkb_core::error::{MkbError, MkbResult};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{CommandContext, RecipeArgs};
use output::errors::ErrorFormatter;

/// Default log filter
const DEFAULT_FILTER: &str = "mkb=info,mkb_recipe=info,mkb_config=info";

/// Filter under --verbose
const VERBOSE_FILTER: &str = "mkb=debug,mkb_recipe=debug,mkb_config=debug,mkb_core=debug";

/// Generate and build nested sub-builds
#[derive(Parser)]
#[command(name = "mkb", version, about = "Generate and build nested sub-builds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Parent configuration (default: buildout.cfg, searched upwards)
    #[arg(short, long, global = true, env = "MKB_CONFIG", value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Override a recipe option; repeatable, "\n" separates list entries
    #[arg(long = "set", global = true, value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Fail when scaffolding, bootstrapping or the nested build exits non-zero
    #[arg(long, global = true)]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold, configure, bootstrap and build a sub-build
    Install { part: String },
    /// Bootstrap and rebuild an existing sub-build
    Update { part: String },
    /// Validate a part's options and print them
    Check { part: String },
    /// Print the configuration a sub-build would get
    Render { part: String },
    /// Run the sub-build's test runner
    Test {
        part: String,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Show version information
    Version,
    #[command(external_subcommand)]
    External(Vec<String>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_panic_handler();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> MkbResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| MkbError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let cwd = current_dir()?;
        let settings = ConfigLoader::new(cwd.clone()).load_global_settings().await;

        let log_filter = settings
            .as_ref()
            .ok()
            .and_then(Option::as_ref)
            .and_then(GlobalSettings::log_filter);
        setup_logging(cli.verbose, log_filter);
        debug!("mkb v{}", env!("CARGO_PKG_VERSION"));

        let ctx = CommandContext::new(
            cwd,
            RecipeArgs {
                config: cli.config,
                set: cli.set,
                strict: cli.strict,
            },
            settings?,
        );

        match cli.command {
            Some(command) => commands::dispatch_command(command, &ctx).await,
            None => commands::show_help(&ctx).await,
        }
    })
}

fn current_dir() -> MkbResult<Utf8PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| MkbError::io("Failed to get current directory".to_string(), e))?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|path| MkbError::ConfigValidation {
        field: "cwd".to_string(),
        reason: format!("current directory is not valid UTF-8: {}", path.display()),
    })
}

fn setup_logging(verbose: bool, settings_filter: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(settings_filter.unwrap_or(DEFAULT_FILTER)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("mkb encountered an unexpected error: {}", panic_info);
        eprintln!("mkb crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/mkb-tools/mkb/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
