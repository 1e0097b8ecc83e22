//! `mkb render` command implementation.
//!
//! Prints the configuration text synthesis would write, without touching
//! the filesystem.

use mkb_core::error::MkbResult;

use super::CommandContext;

/// Execute the `mkb render` command
pub async fn execute(part: &str, ctx: &CommandContext) -> MkbResult<()> {
    let recipe = ctx.load_recipe(part).await?;
    let options = recipe.validate().await?;
    let text = recipe.render(&options)?;

    ctx.output.plain(text.trim_end_matches('\n'));
    Ok(())
}
