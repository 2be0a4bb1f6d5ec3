use serde::Serialize;
use std::fmt;

/// Classified transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    /// Host name could not be resolved
    Dns,
    /// TCP connection refused or reset
    ConnectionRefused,
    /// TLS handshake or certificate failure
    Tls,
    /// Redirect chain longer than the configured maximum
    TooManyRedirects,
    /// Redirect chain revisited a URL
    RedirectLoop,
    /// Redirect with an unusable `Location` header
    InvalidRedirect,
    /// Response body could not be read
    Body,
    /// Anything else reported by the HTTP client
    Other,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns_failure",
            Self::ConnectionRefused => "connection_refused",
            Self::Tls => "tls_error",
            Self::TooManyRedirects => "too_many_redirects",
            Self::RedirectLoop => "redirect_loop",
            Self::InvalidRedirect => "invalid_redirect",
            Self::Body => "body_error",
            Self::Other => "network_error",
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL was recorded without being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// robots.txt disallows the path for our user agent
    RobotsDenied,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RobotsDenied => f.write_str("robots_denied"),
        }
    }
}

/// Outcome of one attempted URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlOutcome {
    /// A response was received; any status code counts, including 4xx/5xx
    Success {
        status_code: u16,
        content_type: Option<String>,
        final_url: String,
        /// Body was cut at `maximumResponseSize`
        truncated: bool,
    },

    /// Transport-level failure
    NetworkError {
        kind: NetworkErrorKind,
        message: String,
    },

    /// Request exceeded its timeout
    Timeout,

    /// Never fetched
    Skipped { reason: SkipReason },
}

impl CrawlOutcome {
    /// Returns the HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns true for a 2xx response
    pub fn is_ok(&self) -> bool {
        self.status_code().is_some_and(|code| (200..300).contains(&code))
    }

    /// Returns true for network errors and timeouts
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns true if this outcome is a smoke-test finding
    ///
    /// Non-2xx responses, network errors and timeouts are problems. Skipped
    /// URLs are not.
    pub fn is_problem(&self) -> bool {
        match self {
            Self::Success { .. } => !self.is_ok(),
            Self::NetworkError { .. } | Self::Timeout => true,
            Self::Skipped { .. } => false,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Success { truncated: true, .. })
    }

    /// Short label used by the text and markdown renderers
    pub fn label(&self) -> String {
        match self {
            Self::Success { status_code, .. } => status_code.to_string(),
            Self::NetworkError { kind, .. } => kind.to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::Skipped { reason } => format!("skipped:{}", reason),
        }
    }
}

/// One attempted URL
///
/// Immutable once created; appended to the report in processing order and
/// sorted by `(depth, sequence)` when the report is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// Normalized URL
    pub url: String,

    /// Link distance from the base URL
    pub depth: u32,

    /// Frontier acceptance order
    pub sequence: u64,

    /// Page the URL was discovered on; `None` for the base URL
    pub parent: Option<String>,

    pub outcome: CrawlOutcome,

    /// URLs that answered with a redirect before the final response
    pub redirect_chain: Vec<String>,

    pub response_time_ms: u64,

    /// Every link extracted from the page, normalized, in document order
    pub discovered_links: Vec<String>,
}
