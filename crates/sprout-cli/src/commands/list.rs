//! `sprout list` command implementation.
//!
//! Lists the dependencies declared by the nearest package.json with live
//! metadata, in declaration order.

use sprout_core::error::{SproutError, SproutResult};

use super::search::result_lines;
use super::CommandContext;

/// Execute the `sprout list` command
pub async fn execute(ctx: &CommandContext) -> SproutResult<()> {
    let Some(listing) = ctx.services.project_listing(&ctx.cwd).await? else {
        return Err(SproutError::ManifestNotFound {
            start: ctx.cwd.display().to_string(),
        });
    };

    ctx.output.step("📦", &format!("Dependencies of {}", listing.manifest_path.display()));
    if listing.result.is_empty() {
        ctx.output.info("No dependencies declared");
        return Ok(());
    }

    for line in result_lines(&listing.result, &listing.dependencies) {
        ctx.output.line(&line);
    }
    Ok(())
}
