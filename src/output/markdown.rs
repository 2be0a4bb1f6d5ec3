//! Markdown report generation
//!
//! This module generates human-readable markdown reports of crawl results,
//! including run information, statistics, and a table of problem URLs.

use crate::filter::FilterSet;
use crate::output::traits::{OutputResult, ReportRenderer};
use crate::report::{CrawlOutcome, CrawlReport};

/// Maximum number of rows in the results table
const MAX_RESULT_ROWS: usize = 500;

/// Renders the markdown report
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, report: &CrawlReport, filters: &FilterSet) -> OutputResult<String> {
        Ok(format_markdown_report(report, filters))
    }
}

/// Formats a crawl report as markdown
///
/// # Arguments
///
/// * `report` - The finalized crawl report
/// * `filters` - Selects which results appear in the results table
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(report: &CrawlReport, filters: &FilterSet) -> String {
    let summary = report.summary();
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Http Smoke Test Report ({})\n\n", report.base_url));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Base URL**: {}\n", report.base_url));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_ms as f64 / 1000.0
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if !filters.is_empty() {
        md.push_str(&format!("- **Filters**: `{}`\n", filters.to_expression_string()));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total URLs**: {}\n", summary.total));
    md.push_str(&format!("- **Unique Links**: {}\n", summary.unique_links));
    md.push_str(&format!("- **Problems**: {}\n", summary.problems()));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", summary.success_rate));

    // Outcome breakdown
    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| 2xx | {} |\n", summary.successes));
    md.push_str(&format!("| 3xx | {} |\n", summary.redirects));
    md.push_str(&format!("| 4xx | {} |\n", summary.client_errors));
    md.push_str(&format!("| 5xx | {} |\n", summary.server_errors));
    md.push_str(&format!("| Network Error | {} |\n", summary.network_errors));
    md.push_str(&format!("| Timeout | {} |\n", summary.timeouts));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| Truncated | {} |\n\n", summary.truncated));

    // Status code breakdown
    if !summary.status_codes.is_empty() {
        md.push_str("## Status Codes\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for (code, count) in &summary.status_codes {
            md.push_str(&format!("| {} | {} |\n", code, count));
        }
        md.push('\n');
    }

    // Depth breakdown
    if !summary.depths.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | URLs |\n");
        md.push_str("|-------|------|\n");
        for (depth, count) in &summary.depths {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Results
    let selected: Vec<_> = report.filtered(filters).collect();
    if !selected.is_empty() {
        md.push_str("## Results\n\n");
        md.push_str("| Outcome | Depth | URL | Time (ms) | Linked From |\n");
        md.push_str("|---------|-------|-----|-----------|-------------|\n");

        for result in selected.iter().take(MAX_RESULT_ROWS) {
            let mut outcome = result.outcome.label();
            if let CrawlOutcome::Success { truncated: true, .. } = result.outcome {
                outcome.push_str(" (truncated)");
            }
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                outcome,
                result.depth,
                escape_cell(&result.url),
                result.response_time_ms,
                result.parent.as_deref().map(escape_cell).unwrap_or_default()
            ));
        }

        if selected.len() > MAX_RESULT_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                selected.len() - MAX_RESULT_ROWS
            ));
        }
        md.push('\n');
    }

    // Network errors with messages
    let errors: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| match &r.outcome {
            CrawlOutcome::NetworkError { kind, message } => Some((r, kind, message)),
            _ => None,
        })
        .collect();
    if !errors.is_empty() {
        md.push_str("## Network Errors\n\n");
        for (result, kind, message) in errors {
            md.push_str(&format!("- {} `{}`: {}\n", result.url, kind, message));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
