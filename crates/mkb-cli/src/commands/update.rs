//! `mkb update` command implementation.
//!
//! Re-runs bootstrap (when needed) and the nested build. The sub-build
//! configuration is left as it is.

use mkb_core::error::MkbResult;

use super::{report_steps, CommandContext};

/// Execute the `mkb update` command
pub async fn execute(part: &str, ctx: &CommandContext) -> MkbResult<()> {
    let recipe = ctx.load_recipe(part).await?;
    ctx.output
        .step("🔄", &format!("Updating sub-build [{}]", recipe.name()));

    let report = recipe.update().await?;
    report_steps(&report, ctx);
    Ok(())
}
