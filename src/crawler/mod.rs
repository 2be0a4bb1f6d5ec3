//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect handling and a response size cap
//! - HTML parsing and link extraction
//! - The frontier and request pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod pacer;
mod parser;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_url, FetchOptions, FetchOutcome};
pub use frontier::{CrawlTask, Frontier, PushOutcome};
pub use pacer::Pacer;
pub use parser::{extract_links, is_html, ExtractedLink};

use crate::config::{CrawlerConfiguration, OutputConfiguration};
use crate::report::CrawlReport;
use crate::SmokeError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Crawl from `base_url` until the frontier drains or `cancel` fires
/// 3. Write the report to every configured output sink
///
/// Sink failures are logged and do not fail the call; the report is returned
/// either way.
///
/// # Arguments
///
/// * `base_url` - The URL to start from
/// * `config` - The crawler configuration
/// * `output` - Output sinks and filters
/// * `cancel` - Cancels the run; the partial report is still written
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed or was cancelled
/// * `Err(SmokeError)` - The base URL was invalid or the client could not be built
pub async fn crawl(
    base_url: &str,
    config: CrawlerConfiguration,
    output: &OutputConfiguration,
    cancel: CancellationToken,
) -> Result<CrawlReport, SmokeError> {
    let coordinator = Coordinator::new(config)?;
    let report = coordinator.run(base_url, output, cancel).await?;

    let failures = crate::output::write_report(&report, output);
    for failure in &failures {
        tracing::warn!("Failed to write report to {}: {}", failure.sink, failure.error);
    }

    Ok(report)
}
