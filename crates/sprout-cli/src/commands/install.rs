//! `sprout install` and `sprout update` command implementations.
//!
//! Both run the project's package manager in the directory of the nearest
//! package.json, or the current directory when there is none.

use sprout_config::InstallMode;
use sprout_core::error::SproutResult;

use super::CommandContext;
use crate::installer::InstallOutcome;
use crate::services::project_dir;

/// Execute the `sprout install` command
pub async fn execute(name: &str, dev: bool, ctx: &CommandContext) -> SproutResult<()> {
    let dir = project_dir(&ctx.cwd);
    let kind = if dev { "dev dependency" } else { "dependency" };
    ctx.output.step("➕", &format!("Installing {} {}", kind, name));

    let outcome = ctx.services.installer.install(&dir, name, dev).await?;
    report(outcome, ctx);
    Ok(())
}

/// Execute the `sprout update` command
pub async fn update(name: &str, ctx: &CommandContext) -> SproutResult<()> {
    let dir = project_dir(&ctx.cwd);
    ctx.output.step("⬆️", &format!("Updating {}", name));

    let outcome = ctx.services.installer.update(&dir, name).await?;
    report(outcome, ctx);
    Ok(())
}

fn report(outcome: Option<InstallOutcome>, ctx: &CommandContext) {
    let Some(outcome) = outcome else {
        ctx.output.warn("No package name given; nothing to do");
        return;
    };

    let output = outcome.output.trim();
    if !output.is_empty() {
        ctx.output.info(output);
    }
    let verb = match outcome.mode {
        InstallMode::Add => "Added",
        InstallMode::Update => "Updated",
    };
    ctx.output.success(&format!("{} {} with {}", verb, outcome.package, outcome.manager));
}
