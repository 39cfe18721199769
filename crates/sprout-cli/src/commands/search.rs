//! `sprout search` command implementation.

use sprout_config::scan_dependencies;
use sprout_core::error::SproutResult;
use sprout_core::types::{ManifestDependencySet, SearchResult};

use super::CommandContext;
use crate::app::view::{manifest_marker, package_row};
use crate::output::format_count;

/// Execute the `sprout search` command
pub async fn execute(query: &str, ctx: &CommandContext) -> SproutResult<()> {
    let services = &ctx.services;
    ctx.output.step("🔍", &format!("Searching npm for '{}'", query));

    let result = services.aggregator.search(query, services.page_size()).await?;
    if result.is_empty() {
        ctx.output.warn(&format!("No packages found for '{}'", query));
        return Ok(());
    }

    // Marking is best effort outside a project
    let (_, manifest) = scan_dependencies(&ctx.cwd).await.unwrap_or_default();

    ctx.output.info(&format!(
        "Showing {} of {} packages",
        result.len(),
        format_count(result.total)
    ));
    for line in result_lines(&result, &manifest) {
        ctx.output.line(&line);
    }
    Ok(())
}

/// Numbered rows with descriptions, marked against `manifest`
pub fn result_lines(result: &SearchResult, manifest: &ManifestDependencySet) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.len() * 2);
    for (i, record) in result.packages.iter().enumerate() {
        lines.push(package_row(i + 1, record, &manifest_marker(manifest, record)));
        if !record.description.is_empty() {
            lines.push(format!("    {}", record.description));
        }
    }
    lines
}
