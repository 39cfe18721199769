//! Plain-text rendering of the session and of single packages

use sprout_core::types::{series_values, DependencyStatus, DownloadPoint, ManifestDependencySet, PackageRecord};

use super::{App, ReadmeState};
use crate::output::{format_count, or_na, sparkline, truncate};

const MIN_WIDTH: usize = 40;
const README_LINES: usize = 30;

/// Render the whole session
pub fn render(app: &App) -> String {
    let width = (app.width as usize).max(MIN_WIDTH);
    let mut out = String::new();

    let heading = if app.query.is_empty() {
        match &app.manifest_path {
            Some(path) => format!("Dependencies of {}", path.display()),
            None => "No package.json found; type a query to search npm".to_string(),
        }
    } else {
        format!("Results for '{}' ({} total)", app.query, format_count(app.total))
    };
    out.push_str(&truncate(&heading, width));
    out.push('\n');
    out.push_str(&"─".repeat(width.min(80)));
    out.push('\n');

    if app.loading {
        out.push_str("Loading…\n");
    }

    for (i, record) in app.results.iter().enumerate() {
        let cursor = if i == app.selected { '>' } else { ' ' };
        let marker = status_marker(app, record);
        let row = package_row(i + 1, record, &marker);
        out.push(cursor);
        out.push_str(&truncate(&row, width - 1));
        out.push('\n');
        if !record.description.is_empty() {
            out.push_str("     ");
            out.push_str(&truncate(&record.description, width.saturating_sub(5)));
            out.push('\n');
        }
    }

    if app.details_open {
        if let Some(record) = app.selected_package() {
            out.push('\n');
            out.push_str(&details(record, trend_for(app, record)));
            out.push_str(&readme_panel(&app.readme));
        }
    }

    if let Some(status) = &app.status {
        out.push('\n');
        out.push_str(&truncate(status, width));
        out.push('\n');
    }
    out.push_str("\n[text] search  [n] select  o details  i/I install/dev  u update  l listing  q quit\n");
    out
}

/// One numbered result row
pub fn package_row(index: usize, record: &PackageRecord, marker: &str) -> String {
    let mut row = format!(
        "{:>2}. {} {}  {}/wk  {}  {}",
        index,
        record.name,
        or_na(&record.version),
        format_count(record.weekly_downloads),
        or_na(&record.license),
        or_na(record.display_author()),
    );
    if !marker.is_empty() {
        row.push_str("  ");
        row.push_str(marker);
    }
    row
}

/// Installed or outdated marker of a record relative to a manifest
pub fn manifest_marker(manifest: &ManifestDependencySet, record: &PackageRecord) -> String {
    match manifest.status_of(record) {
        DependencyStatus::NotDeclared => String::new(),
        DependencyStatus::Declared { installed: true } => "✓ installed".to_string(),
        DependencyStatus::Declared { installed: false } => "declared".to_string(),
        DependencyStatus::Outdated { from, to, .. } => format!("↑ {} → {}", from, to),
    }
}

fn status_marker(app: &App, record: &PackageRecord) -> String {
    if app.installing.contains(&record.name) {
        return "installing…".to_string();
    }
    let marker = manifest_marker(&app.manifest, record);
    if marker.is_empty() && app.installed.contains(&record.name) {
        return "✓ installed".to_string();
    }
    marker
}

fn trend_for<'a>(app: &'a App, record: &PackageRecord) -> &'a [DownloadPoint] {
    if app.trend_package.as_deref() == Some(record.name.as_str()) {
        &app.trend
    } else {
        &[]
    }
}

/// Links, metadata and weekly trend of one package
pub fn details(record: &PackageRecord, trend: &[DownloadPoint]) -> String {
    let mut out = format!("{} {}\n", record.name, or_na(&record.version));
    if !record.description.is_empty() {
        out.push_str(&format!("  {}\n", record.description));
    }
    out.push_str(&format!("  License:    {}\n", or_na(&record.license)));
    out.push_str(&format!("  Author:     {}\n", or_na(record.display_author())));
    out.push_str(&format!("  Downloads:  {}/week\n", format_count(record.weekly_downloads)));
    out.push_str(&format!("  npm:        {}\n", or_na(&record.npm_url)));
    out.push_str(&format!("  Homepage:   {}\n", or_na(&record.homepage)));
    out.push_str(&format!("  Repository: {}\n", or_na(&record.repository)));
    if !record.keywords.is_empty() {
        let keywords: Vec<&str> = record.keywords.iter().map(String::as_str).collect();
        out.push_str(&format!("  Keywords:   {}\n", keywords.join(", ")));
    }

    if let (Some(first), Some(last)) = (trend.first(), trend.last()) {
        out.push_str(&format!(
            "  Trend:      {} ({} .. {}, {} weeks)\n",
            sparkline(&series_values(trend)),
            first.date,
            last.date,
            trend.len()
        ));
    }
    out
}

fn readme_panel(state: &ReadmeState) -> String {
    match state {
        ReadmeState::Idle => String::new(),
        ReadmeState::Loading => "\nREADME: loading…\n".to_string(),
        ReadmeState::Failed(reason) => format!("\nREADME unavailable: {}\n", reason),
        ReadmeState::Loaded { repo, content } => {
            let mut out = format!("\nREADME ({})\n", repo);
            let total = content.lines().count();
            for line in content.lines().take(README_LINES) {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
            if total > README_LINES {
                out.push_str(&format!("  … {} more lines\n", total - README_LINES));
            }
            out
        }
    }
}
