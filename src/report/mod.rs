//! Crawl report types
//!
//! Every attempted URL ends up as one [`CrawlResult`] in a [`CrawlReport`].
//! The [`ReportBuilder`] is owned by the coordinator for the duration of a run
//! and produces the finalized, read-only report.

mod builder;
mod result;
mod summary;

pub use builder::{CrawlReport, ReportBuilder};
pub use result::{CrawlOutcome, CrawlResult, NetworkErrorKind, SkipReason};
pub use summary::ReportSummary;
