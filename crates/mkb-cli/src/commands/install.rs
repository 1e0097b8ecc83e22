//! `mkb install` command implementation.
//!
//! Validates the part's options, scaffolds the sub-build, writes its
//! configuration, then bootstraps and builds it.

use mkb_core::error::MkbResult;

use super::{report_steps, CommandContext};

/// Execute the `mkb install` command
pub async fn execute(part: &str, ctx: &CommandContext) -> MkbResult<()> {
    let recipe = ctx.load_recipe(part).await?;
    ctx.output
        .step("📦", &format!("Installing sub-build [{}]", recipe.name()));

    let report = recipe.install().await?;
    report_steps(&report, ctx);

    if let Some(path) = &report.config_path {
        ctx.output.success(&format!("Wrote {}", path));
    }
    Ok(())
}
