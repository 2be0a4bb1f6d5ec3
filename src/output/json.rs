//! JSON report

use crate::filter::FilterSet;
use crate::output::traits::{OutputResult, ReportRenderer};
use crate::report::{CrawlReport, CrawlResult, ReportSummary};
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Renders `{ "report": ..., "summary": ... }`, pretty-printed
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &CrawlReport, filters: &FilterSet) -> OutputResult<String> {
        let mut json = format_json_report(report, filters)?;
        json.push('\n');
        Ok(json)
    }
}

/// The report with only the selected results
#[derive(Serialize)]
struct FilteredReport<'a> {
    base_url: &'a str,
    status: CrawlState,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    results: Vec<&'a CrawlResult>,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    report: FilteredReport<'a>,
    summary: ReportSummary,
}

/// Formats a report as pretty-printed JSON
pub fn format_json_report(
    report: &CrawlReport,
    filters: &FilterSet,
) -> Result<String, serde_json::Error> {
    let document = JsonDocument {
        report: FilteredReport {
            base_url: &report.base_url,
            status: report.status,
            started_at: report.started_at,
            finished_at: report.finished_at,
            results: report.filtered(filters).collect(),
        },
        summary: report.summary(),
    };

    serde_json::to_string_pretty(&document)
}
