//! `sprout info` command implementation.
//!
//! Shows one package's metadata, its weekly download trend and, unless
//! disabled, its README. The trend and README are optional: their failures
//! are reported as warnings.

use tracing::debug;

use sprout_core::error::{SproutError, SproutResult};

use super::CommandContext;
use crate::app::view::details;

/// Execute the `sprout info` command
pub async fn execute(name: &str, with_readme: bool, ctx: &CommandContext) -> SproutResult<()> {
    let services = &ctx.services;
    let name = name.trim();

    let (record, trend) = tokio::join!(
        services.aggregator.resolve(name),
        services.history.history(name, services.window_days()),
    );

    // Enrichment degrades silently; ask again to tell a missing package
    // from an unreachable registry
    if record.version.is_empty() {
        let latest = services.aggregator.client().latest_metadata(name).await?;
        if latest.version.is_empty() {
            return Err(SproutError::PackageNotFound { name: name.to_string() });
        }
        debug!("latest metadata for {} recovered on retry", name);
    }

    let trend = trend.unwrap_or_else(|e| {
        ctx.output.warn(&format!("Download trend unavailable: {}", e));
        Vec::new()
    });
    ctx.output.line(details(&record, &trend).trim_end());

    if !with_readme {
        return Ok(());
    }
    if record.repository.is_empty() {
        ctx.output.warn("README unavailable: no repository URL");
        return Ok(());
    }

    match services.readme.resolve(&record.repository).await {
        Ok(readme) => {
            ctx.output.line("");
            ctx.output.step("📖", &format!("README ({}/{})", readme.owner, readme.repo));
            ctx.output.line(&readme.content);
        }
        Err(e) => {
            debug!("README for {} failed: {:?}", name, e);
            ctx.output.warn(&format!("README unavailable: {}", e));
        }
    }
    Ok(())
}
