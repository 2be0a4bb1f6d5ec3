use crate::filter::FilterSet;
use crate::report::{CrawlResult, ReportSummary};
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Finalized result of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Normalized base URL
    pub base_url: String,

    /// `Completed` or `Aborted`
    pub status: CrawlState,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Results ordered by `(depth, sequence)`
    pub results: Vec<CrawlResult>,
}

impl CrawlReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the result recorded for `url`, if any
    pub fn get(&self, url: &str) -> Option<&CrawlResult> {
        self.results.iter().find(|r| r.url == url)
    }

    /// Wall-clock duration of the run in milliseconds
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Returns the results selected by `filters`, in report order
    ///
    /// The report itself is left untouched.
    pub fn filtered<'a>(&'a self, filters: &'a FilterSet) -> impl Iterator<Item = &'a CrawlResult> {
        self.results.iter().filter(move |r| filters.selects(r))
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_report(self)
    }
}

/// Accumulates results while a crawl is running
///
/// Results arrive in completion order; [`ReportBuilder::finish`] restores
/// discovery order.
#[derive(Debug)]
pub struct ReportBuilder {
    base_url: String,
    started_at: DateTime<Utc>,
    results: Vec<CrawlResult>,
}

impl ReportBuilder {
    /// Starts a new report; the start time is taken now
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Appends one result
    pub fn record(&mut self, result: CrawlResult) {
        self.results.push(result);
    }

    /// Number of results recorded so far
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sorts the results by `(depth, sequence)` and seals the report
    pub fn finish(mut self, status: CrawlState) -> CrawlReport {
        self.results.sort_by_key(|r| (r.depth, r.sequence));

        CrawlReport {
            base_url: self.base_url,
            status,
            started_at: self.started_at,
            finished_at: Utc::now(),
            results: self.results,
        }
    }
}
