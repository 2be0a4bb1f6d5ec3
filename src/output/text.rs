//! Plain text report

use crate::filter::FilterSet;
use crate::output::traits::{OutputResult, ReportRenderer};
use crate::report::{CrawlOutcome, CrawlReport, CrawlResult};

/// Renders `[STATUS] depth url (ms)` lines followed by a summary block
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &CrawlReport, filters: &FilterSet) -> OutputResult<String> {
        Ok(format_text_report(report, filters))
    }
}

/// Formats a report as plain text
pub fn format_text_report(report: &CrawlReport, filters: &FilterSet) -> String {
    let mut out = String::new();

    for result in report.filtered(filters) {
        out.push_str(&format_result_line(result));
    }

    let summary = report.summary();

    out.push('\n');
    out.push_str(&format!("Crawl of {} {}\n", report.base_url, summary.status));
    out.push_str(&format!(
        "  {} URLs in {:.2}s: {} ok, {} redirects, {} client errors, {} server errors\n",
        summary.total,
        summary.duration_ms as f64 / 1000.0,
        summary.successes,
        summary.redirects,
        summary.client_errors,
        summary.server_errors
    ));
    out.push_str(&format!(
        "  {} network errors, {} timeouts, {} skipped, {} truncated\n",
        summary.network_errors, summary.timeouts, summary.skipped, summary.truncated
    ));
    out.push_str(&format!("  Success rate: {:.1}%\n", summary.success_rate));

    if !summary.problem_urls.is_empty() {
        out.push_str(&format!("  Problems ({}):\n", summary.problem_urls.len()));
        for url in &summary.problem_urls {
            out.push_str(&format!("    - {}\n", url));
        }
    }

    out
}

fn format_result_line(result: &CrawlResult) -> String {
    let mut line = format!(
        "[{}] {} {} ({} ms)",
        result.outcome.label().to_uppercase(),
        result.depth,
        result.url,
        result.response_time_ms
    );

    match &result.outcome {
        CrawlOutcome::Success {
            final_url,
            truncated,
            ..
        } => {
            if !result.redirect_chain.is_empty() {
                line.push_str(&format!(" -> {}", final_url));
            }
            if *truncated {
                line.push_str(" [truncated]");
            }
        }
        CrawlOutcome::NetworkError { message, .. } => {
            line.push_str(&format!(" {}", message));
        }
        CrawlOutcome::Timeout | CrawlOutcome::Skipped { .. } => {}
    }

    if let Some(parent) = &result.parent {
        if result.outcome.is_problem() {
            line.push_str(&format!(" (linked from {})", parent));
        }
    }

    line.push('\n');
    line
}
