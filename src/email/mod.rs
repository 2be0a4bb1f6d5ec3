//! Email report
//!
//! The crawl engine supplies raw values ([`ReportContext`]); the bundled
//! template turns them into a plain text body, and a [`ReportMailer`] sends it.

mod smtp;
mod template;

pub use smtp::{ReportMailer, SmtpMailer};
pub use template::{EmailTemplate, REPORT_TEMPLATE};

use crate::config::{CrawlerConfiguration, OutputConfiguration};
use crate::report::CrawlReport;
use thiserror::Error;

/// Shown for an unset limit
const NO_LIMITS: &str = "no limits";

/// Shown when no filter expression was given
const NO_FILTERS: &str = "no filters used";

/// Errors from building or sending the email report
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("No recipients given")]
    NoRecipients,
}

/// Values rendered into the report email
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub base_url: String,
    pub user_agent: String,
    pub filters: String,
    pub max_crawl_count: String,
    pub max_crawl_depth: String,
    pub max_response_size: String,
    pub respect_robots: bool,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub total: u64,
    pub successes: u64,
    pub redirects: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub network_errors: u64,
    pub timeouts: u64,
    pub skipped: u64,
    pub success_rate: f64,
    pub problem_urls: Vec<String>,
}

impl ReportContext {
    /// Collects the raw values for one finished crawl
    pub fn new(
        report: &CrawlReport,
        config: &CrawlerConfiguration,
        output: &OutputConfiguration,
    ) -> Self {
        let summary = report.summary();

        let filters = if output.filters.is_empty() {
            NO_FILTERS.to_string()
        } else {
            output.filters.to_expression_string()
        };

        Self {
            base_url: report.base_url.clone(),
            user_agent: config.user_agent.clone(),
            filters,
            max_crawl_count: limit(config.maximum_crawl_count),
            max_crawl_depth: limit(config.maximum_crawl_depth),
            max_response_size: limit(config.maximum_response_size),
            respect_robots: config.respect_robots,
            status: report.status.to_string(),
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
            total: summary.total,
            successes: summary.successes,
            redirects: summary.redirects,
            client_errors: summary.client_errors,
            server_errors: summary.server_errors,
            network_errors: summary.network_errors,
            timeouts: summary.timeouts,
            skipped: summary.skipped,
            success_rate: summary.success_rate,
            problem_urls: summary.problem_urls,
        }
    }

    /// Renders the body with [`REPORT_TEMPLATE`]
    pub fn render(&self) -> String {
        let problems = if self.problem_urls.is_empty() {
            "None found.".to_string()
        } else {
            self.problem_urls
                .iter()
                .map(|url| format!("- {}", url))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let total = self.total.to_string();
        let successes = self.successes.to_string();
        let redirects = self.redirects.to_string();
        let client_errors = self.client_errors.to_string();
        let server_errors = self.server_errors.to_string();
        let network_errors = self.network_errors.to_string();
        let timeouts = self.timeouts.to_string();
        let skipped = self.skipped.to_string();
        let success_rate = format!("{:.1}", self.success_rate);
        let respect_robots = if self.respect_robots { "yes" } else { "no" };

        REPORT_TEMPLATE.render(&[
            ("base_url", &self.base_url),
            ("status", &self.status),
            ("started_at", &self.started_at),
            ("finished_at", &self.finished_at),
            ("user_agent", &self.user_agent),
            ("filters", &self.filters),
            ("max_crawl_count", &self.max_crawl_count),
            ("max_crawl_depth", &self.max_crawl_depth),
            ("max_response_size", &self.max_response_size),
            ("respect_robots", respect_robots),
            ("total", &total),
            ("successes", &successes),
            ("redirects", &redirects),
            ("client_errors", &client_errors),
            ("server_errors", &server_errors),
            ("network_errors", &network_errors),
            ("timeouts", &timeouts),
            ("skipped", &skipped),
            ("success_rate", &success_rate),
            ("problems", &problems),
        ])
    }
}

fn limit<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NO_LIMITS.to_string())
}

/// Subject line for the report email
pub fn report_subject(base_url: &str) -> String {
    format!("Http Smoke Test Report ({})", base_url)
}

/// Renders and sends the report email
///
/// # Arguments
///
/// * `mailer` - Transport to send with
/// * `from_address` - Sender address
/// * `recipients` - One message is sent, addressed to all of them
/// * `report` - The finished crawl report
/// * `config` - The crawler configuration used for the run
/// * `output` - The output configuration (for the filter list)
pub async fn send_report_email(
    mailer: &dyn ReportMailer,
    from_address: &str,
    recipients: &[String],
    report: &CrawlReport,
    config: &CrawlerConfiguration,
    output: &OutputConfiguration,
) -> Result<(), EmailError> {
    let body = ReportContext::new(report, config, output).render();
    let subject = report_subject(&report.base_url);

    mailer
        .send_email_report(from_address, &subject, recipients, &body)
        .await
}
