use crate::filter::FilterSet;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "SmokeTestCrawler/1.0";

/// Default number of concurrent fetch workers
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default robots.txt fetch timeout (seconds)
pub const DEFAULT_ROBOTS_TIMEOUT_SECS: u64 = 5;

/// Default maximum number of redirect hops followed per request
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Sink used when no output is configured
pub const DEFAULT_OUTPUT: &str = "stdout";

/// Crawler behavior for a single run
///
/// Immutable once the crawl starts. Every limit is an explicit `Option`:
/// `None` means "no limit", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerConfiguration {
    /// Minimum interval between successive fetch dispatches, across all workers
    pub delay_between_requests: Duration,

    /// Consult robots.txt before fetching
    pub respect_robots: bool,

    /// Drop links whose `rel` contains `nofollow`
    pub reject_no_follow_links: bool,

    /// User-Agent header and robots.txt agent
    pub user_agent: String,

    /// Maximum number of URLs accepted into the frontier, base URL included
    pub maximum_crawl_count: Option<NonZeroUsize>,

    /// Maximum link depth; the base URL is depth 0
    pub maximum_crawl_depth: Option<u32>,

    /// Response bodies are truncated beyond this many bytes
    pub maximum_response_size: Option<NonZeroUsize>,

    /// Size of the fetch worker pool
    pub concurrency: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Timeout for robots.txt fetches
    pub robots_timeout: Duration,

    /// Redirect hops followed before giving up
    pub max_redirects: usize,

    /// Wall-clock limit for the whole run; expiry cancels it
    pub run_timeout: Option<Duration>,
}

impl Default for CrawlerConfiguration {
    fn default() -> Self {
        Self {
            delay_between_requests: Duration::ZERO,
            respect_robots: false,
            reject_no_follow_links: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            maximum_crawl_count: None,
            maximum_crawl_depth: None,
            maximum_response_size: None,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            robots_timeout: Duration::from_secs(DEFAULT_ROBOTS_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            run_timeout: None,
        }
    }
}

/// Which sinks receive the report and which results they include
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputConfiguration {
    /// Sink identifiers, deduplicated
    pub outputs: BTreeSet<String>,

    /// Filter expressions shared by the scope filter and output selection
    pub filters: FilterSet,
}

impl OutputConfiguration {
    /// Creates an output configuration writing to stdout with no filters
    pub fn stdout() -> Self {
        Self {
            outputs: BTreeSet::from([DEFAULT_OUTPUT.to_string()]),
            filters: FilterSet::default(),
        }
    }
}

/// SMTP settings for the email report
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct EmailConfiguration {
    /// Sender address
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username (credentials are only sent when both are present)
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Use an implicit/STARTTLS relay instead of a plain connection
    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: bool,

    /// Recipients configured in the file; `--emails` replaces these
    #[serde(default)]
    pub recipients: Vec<String>,
}

pub(crate) fn default_from_address() -> String {
    "noreply@smoke-test.local".to_string()
}

pub(crate) fn default_smtp_port() -> u16 {
    587
}

pub(crate) fn default_smtp_tls() -> bool {
    true
}

/// Raw crawler settings as they appear in a config file or on the command line
///
/// Every field is optional so layers can be merged: command line over file
/// over defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlerSection {
    /// Milliseconds between requests
    pub delay_between_requests: Option<u64>,
    pub respect_robots: Option<bool>,
    pub reject_no_follow_links: Option<bool>,
    pub user_agent: Option<String>,
    pub maximum_crawl_count: Option<u64>,
    pub maximum_crawl_depth: Option<u32>,
    /// Bytes
    pub maximum_response_size: Option<u64>,
    pub concurrency: Option<usize>,
    /// Seconds
    pub request_timeout: Option<u64>,
    /// Seconds
    pub robots_timeout: Option<u64>,
    pub max_redirects: Option<usize>,
    /// Seconds
    pub run_timeout: Option<u64>,
}

impl CrawlerSection {
    /// Overlays `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: CrawlerSection) -> CrawlerSection {
        CrawlerSection {
            delay_between_requests: other.delay_between_requests.or(self.delay_between_requests),
            respect_robots: other.respect_robots.or(self.respect_robots),
            reject_no_follow_links: other.reject_no_follow_links.or(self.reject_no_follow_links),
            user_agent: other.user_agent.or(self.user_agent),
            maximum_crawl_count: other.maximum_crawl_count.or(self.maximum_crawl_count),
            maximum_crawl_depth: other.maximum_crawl_depth.or(self.maximum_crawl_depth),
            maximum_response_size: other.maximum_response_size.or(self.maximum_response_size),
            concurrency: other.concurrency.or(self.concurrency),
            request_timeout: other.request_timeout.or(self.request_timeout),
            robots_timeout: other.robots_timeout.or(self.robots_timeout),
            max_redirects: other.max_redirects.or(self.max_redirects),
            run_timeout: other.run_timeout.or(self.run_timeout),
        }
    }
}

/// Raw output settings
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputSection {
    pub outputs: Option<Vec<String>>,
    pub filters: Option<Vec<String>>,
}

impl OutputSection {
    /// Overlays `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: OutputSection) -> OutputSection {
        OutputSection {
            outputs: other.outputs.or(self.outputs),
            filters: other.filters.or(self.filters),
        }
    }
}

/// Top-level shape of a TOML configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub crawler: CrawlerSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub email: Option<EmailConfiguration>,
}

pub(crate) fn non_zero_usize(value: u64) -> Option<NonZeroUsize> {
    usize::try_from(value).ok().and_then(NonZeroUsize::new)
}
