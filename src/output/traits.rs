//! Output renderer trait and error types

use crate::filter::FilterSet;
use crate::report::CrawlReport;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Invalid sink identifier: {0}")]
    InvalidSink(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders a finalized report into a sink's format
///
/// Renderers see the whole report; `filters` decides which results are
/// listed. Summary figures always describe the full report.
pub trait ReportRenderer {
    /// Renders the report
    ///
    /// # Arguments
    ///
    /// * `report` - The finalized crawl report
    /// * `filters` - Selects which results are listed
    fn render(&self, report: &CrawlReport, filters: &FilterSet) -> OutputResult<String>;
}
