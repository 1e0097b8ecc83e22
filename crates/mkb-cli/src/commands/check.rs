//! `mkb check` command implementation.

use mkb_core::error::{MkbError, MkbResult};

use super::CommandContext;

/// Validate the part's options and print the typed view as JSON
pub async fn execute(part: &str, ctx: &CommandContext) -> MkbResult<()> {
    let recipe = ctx.load_recipe(part).await?;
    let options = recipe.validate().await?;

    let json = serde_json::to_string_pretty(&options).map_err(|e| MkbError::ConfigValidation {
        field: part.to_string(),
        reason: format!("cannot serialize options: {}", e),
    })?;

    ctx.output.plain(&json);
    ctx.output
        .success(&format!("Options of [{}] are valid", recipe.name()));
    Ok(())
}
