//! Aggregate statistics over a crawl report

use crate::report::{CrawlOutcome, CrawlReport};
use crate::state::CrawlState;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Final run status
    pub status: CrawlState,

    /// Total number of attempted URLs
    pub total: u64,

    /// 2xx responses
    pub successes: u64,

    /// 3xx responses
    pub redirects: u64,

    /// 4xx responses
    pub client_errors: u64,

    /// 5xx responses
    pub server_errors: u64,

    pub network_errors: u64,
    pub timeouts: u64,
    pub skipped: u64,

    /// Responses whose body was cut at the size limit
    pub truncated: u64,

    /// Distinct links seen across all pages
    pub unique_links: u64,

    /// Count of responses by status code
    pub status_codes: BTreeMap<u16, u64>,

    /// Count of results by depth
    pub depths: BTreeMap<u32, u64>,

    /// Percentage of fetched URLs that returned 2xx
    pub success_rate: f64,

    pub duration_ms: u64,

    /// URLs with non-2xx, network error or timeout outcomes, in report order
    pub problem_urls: Vec<String>,
}

impl ReportSummary {
    /// Computes the summary for a finalized report
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut summary = Self {
            status: report.status,
            total: report.results.len() as u64,
            successes: 0,
            redirects: 0,
            client_errors: 0,
            server_errors: 0,
            network_errors: 0,
            timeouts: 0,
            skipped: 0,
            truncated: 0,
            unique_links: 0,
            status_codes: BTreeMap::new(),
            depths: BTreeMap::new(),
            success_rate: 0.0,
            duration_ms: report.duration_ms(),
            problem_urls: Vec::new(),
        };

        let mut links = BTreeSet::new();

        for result in &report.results {
            *summary.depths.entry(result.depth).or_insert(0) += 1;
            links.extend(result.discovered_links.iter().map(String::as_str));

            match &result.outcome {
                CrawlOutcome::Success {
                    status_code,
                    truncated,
                    ..
                } => {
                    *summary.status_codes.entry(*status_code).or_insert(0) += 1;
                    match status_code / 100 {
                        2 => summary.successes += 1,
                        3 => summary.redirects += 1,
                        4 => summary.client_errors += 1,
                        5 => summary.server_errors += 1,
                        _ => {}
                    }
                    if *truncated {
                        summary.truncated += 1;
                    }
                }
                CrawlOutcome::NetworkError { .. } => summary.network_errors += 1,
                CrawlOutcome::Timeout => summary.timeouts += 1,
                CrawlOutcome::Skipped { .. } => summary.skipped += 1,
            }

            if result.outcome.is_problem() {
                summary.problem_urls.push(result.url.clone());
            }
        }

        summary.unique_links = links.len() as u64;

        let attempted = summary.total - summary.skipped;
        if attempted > 0 {
            summary.success_rate = (summary.successes as f64 / attempted as f64) * 100.0;
        }

        summary
    }

    /// Number of problem results
    pub fn problems(&self) -> u64 {
        self.problem_urls.len() as u64
    }

    /// Returns true if no problem was found
    pub fn is_clean(&self) -> bool {
        self.problem_urls.is_empty()
    }
}
