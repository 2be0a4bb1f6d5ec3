//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - GET requests with a per-request timeout
//! - Manual redirect handling with loop detection
//! - Streaming bodies with a size cap
//! - Error classification

use crate::config::CrawlerConfiguration;
use crate::report::NetworkErrorKind;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::error::Error as _;
use std::num::NonZeroUsize;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A final (non-redirect) response was received
    Success {
        /// HTTP status code of the final response
        status_code: u16,
        /// Response headers of the final response
        headers: HeaderMap,
        /// Body bytes, cut at the size limit
        body: Vec<u8>,
        /// The body exceeded the size limit
        truncated: bool,
        /// Final URL after redirects
        final_url: Url,
        /// URLs that answered with a redirect, in order
        redirect_chain: Vec<String>,
    },

    /// Transport failure, including redirect errors
    NetworkError {
        kind: NetworkErrorKind,
        message: String,
        redirect_chain: Vec<String>,
    },

    /// The request exceeded its timeout
    Timeout { redirect_chain: Vec<String> },
}

impl FetchOutcome {
    /// Returns the redirect hops taken before the outcome was decided
    pub fn redirect_chain(&self) -> &[String] {
        match self {
            Self::Success { redirect_chain, .. }
            | Self::NetworkError { redirect_chain, .. }
            | Self::Timeout { redirect_chain } => redirect_chain,
        }
    }

    /// Returns the `Content-Type` header of a successful response
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Success { headers, .. } => headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            _ => None,
        }
    }
}

/// Per-request settings derived from the crawler configuration
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_response_size: Option<NonZeroUsize>,
    pub max_redirects: usize,
}

impl FetchOptions {
    pub fn from_config(config: &CrawlerConfiguration) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
            max_response_size: config.maximum_response_size,
            max_redirects: config.max_redirects,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled on the client; [`fetch_url`] follows them itself so
/// it can record the chain and detect loops.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use smoke_crawler::config::CrawlerConfiguration;
/// use smoke_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfiguration::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfiguration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, following redirects and capping the body size
///
/// # Request Flow
///
/// 1. Send GET request
/// 2. On a 3xx with a `Location` header, record the hop and follow it
///    - A URL seen twice in one chain → `RedirectLoop`
///    - More than `max_redirects` hops → `TooManyRedirects`
///    - Unparseable or non-HTTP(S) target → `InvalidRedirect`
/// 3. Stream the body of the final response, truncating at `max_response_size`
///
/// Any status code on the final response is a `Success`; deciding what counts
/// as broken is the report's job.
pub async fn fetch_url(client: &Client, url: &Url, options: &FetchOptions) -> FetchOutcome {
    let mut current = url.clone();
    let mut redirect_chain: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::from([current.to_string()]);

    loop {
        let response = match client
            .get(current.clone())
            .header(reqwest::header::USER_AGENT, options.user_agent.as_str())
            .timeout(options.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(&e, redirect_chain),
        };

        let status = response.status();

        if status.is_redirection() {
            if let Some(location) = response.headers().get(LOCATION) {
                let next = match location
                    .to_str()
                    .ok()
                    .and_then(|loc| current.join(loc.trim()).ok())
                {
                    Some(mut next) if matches!(next.scheme(), "http" | "https") => {
                        next.set_fragment(None);
                        next
                    }
                    _ => {
                        return FetchOutcome::NetworkError {
                            kind: NetworkErrorKind::InvalidRedirect,
                            message: format!(
                                "{} redirected to unusable location {:?}",
                                current, location
                            ),
                            redirect_chain,
                        };
                    }
                };

                redirect_chain.push(current.to_string());

                if !seen.insert(next.to_string()) {
                    return FetchOutcome::NetworkError {
                        kind: NetworkErrorKind::RedirectLoop,
                        message: format!("redirect loop at {}", next),
                        redirect_chain,
                    };
                }

                if redirect_chain.len() > options.max_redirects {
                    return FetchOutcome::NetworkError {
                        kind: NetworkErrorKind::TooManyRedirects,
                        message: format!(
                            "more than {} redirects starting at {}",
                            options.max_redirects, url
                        ),
                        redirect_chain,
                    };
                }

                tracing::debug!("Redirect {} -> {} ({})", current, next, status.as_u16());
                current = next;
                continue;
            }
        }

        let headers = response.headers().clone();
        let final_url = response.url().clone();

        return match read_body(response, options.max_response_size).await {
            Ok((body, truncated)) => FetchOutcome::Success {
                status_code: status.as_u16(),
                headers,
                body,
                truncated,
                final_url,
                redirect_chain,
            },
            Err(e) => classify_error(&e, redirect_chain),
        };
    }
}

/// Streams the body, stopping once `limit` bytes have been collected
async fn read_body(
    mut response: reqwest::Response,
    limit: Option<NonZeroUsize>,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        if let Some(limit) = limit {
            let remaining = limit.get() - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                return Ok((body, true));
            }
        }
        body.extend_from_slice(&chunk);
    }

    Ok((body, false))
}

/// Maps a reqwest error onto a fetch outcome
fn classify_error(error: &reqwest::Error, redirect_chain: Vec<String>) -> FetchOutcome {
    if error.is_timeout() {
        return FetchOutcome::Timeout { redirect_chain };
    }

    let message = error_chain_message(error);
    let kind = if error.is_connect() {
        // The top-level message embeds the URL; classify on the causes only
        let causes = error.source().map(error_chain_message).unwrap_or_default();
        classify_connect_message(&causes)
    } else if error.is_body() || error.is_decode() {
        NetworkErrorKind::Body
    } else if error.is_redirect() {
        NetworkErrorKind::TooManyRedirects
    } else {
        NetworkErrorKind::Other
    };

    FetchOutcome::NetworkError {
        kind,
        message,
        redirect_chain,
    }
}

/// Joins an error and all of its sources into one message
fn error_chain_message(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Distinguishes DNS and TLS failures from refused connections
///
/// reqwest reports all three as connect errors; only the message tells them
/// apart.
fn classify_connect_message(message: &str) -> NetworkErrorKind {
    let lowered = message.to_ascii_lowercase();

    if lowered.contains("dns")
        || lowered.contains("failed to lookup address")
        || lowered.contains("name or service not known")
        || lowered.contains("no such host")
        || lowered.contains("nodename nor servname")
    {
        NetworkErrorKind::Dns
    } else if lowered.contains("certificate")
        || lowered.contains("tls")
        || lowered.contains("ssl")
        || lowered.contains("handshake")
    {
        NetworkErrorKind::Tls
    } else {
        NetworkErrorKind::ConnectionRefused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> FetchOptions {
        FetchOptions::from_config(&CrawlerConfiguration::default())
    }

    fn client() -> Client {
        build_http_client(&CrawlerConfiguration::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CrawlerConfiguration::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_classify_connect_message() {
        assert_eq!(
            classify_connect_message("error trying to connect: dns error: failed to lookup address information"),
            NetworkErrorKind::Dns
        );
        assert_eq!(
            classify_connect_message("error trying to connect: invalid peer certificate: UnknownIssuer"),
            NetworkErrorKind::Tls
        );
        assert_eq!(
            classify_connect_message("error trying to connect: tcp connect error: Connection refused (os error 111)"),
            NetworkErrorKind::ConnectionRefused
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let outcome = fetch_url(&client(), &url, &options()).await;

        assert_eq!(outcome.content_type(), Some("text/html"));
        match outcome {
            FetchOutcome::Success {
                status_code,
                body,
                truncated,
                redirect_chain,
                ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(body, b"<html></html>");
                assert!(!truncated);
                assert!(redirect_chain.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_success_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let outcome = fetch_url(&client(), &url, &options()).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Success {
                status_code: 404,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_body_truncated_at_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
            .mount(&server)
            .await;

        let mut opts = options();
        opts.max_response_size = NonZeroUsize::new(100);

        let url = Url::parse(&format!("{}/big", server.uri())).unwrap();
        match fetch_url(&client(), &url, &opts).await {
            FetchOutcome::Success {
                body, truncated, ..
            } => {
                assert_eq!(body.len(), 100);
                assert!(truncated);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_body_at_exact_limit_not_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&server)
            .await;

        let mut opts = options();
        opts.max_response_size = NonZeroUsize::new(100);

        let url = Url::parse(&format!("{}/exact", server.uri())).unwrap();
        match fetch_url(&client(), &url, &opts).await {
            FetchOutcome::Success {
                body, truncated, ..
            } => {
                assert_eq!(body.len(), 100);
                assert!(!truncated);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_follows_redirect_chain() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/middle"))
            .mount(&server)
            .await;
        Mock::given(path("/middle"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        match fetch_url(&client(), &url, &options()).await {
            FetchOutcome::Success {
                status_code,
                final_url,
                redirect_chain,
                ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(final_url.path(), "/new");
                assert_eq!(
                    redirect_chain,
                    vec![
                        format!("{}/old", server.uri()),
                        format!("{}/middle", server.uri()),
                    ]
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_redirect_loop_detected() {
        let server = MockServer::start().await;
        Mock::given(path("/a"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b"))
            .mount(&server)
            .await;
        Mock::given(path("/b"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/a"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/a", server.uri())).unwrap();
        let outcome = fetch_url(&client(), &url, &options()).await;

        assert!(matches!(
            outcome,
            FetchOutcome::NetworkError {
                kind: NetworkErrorKind::RedirectLoop,
                ..
            }
        ));
        assert_eq!(outcome.redirect_chain().len(), 2);
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let server = MockServer::start().await;
        for i in 0..5 {
            Mock::given(path(format!("/hop{}", i)))
                .respond_with(
                    ResponseTemplate::new(302).insert_header("Location", format!("/hop{}", i + 1).as_str()),
                )
                .mount(&server)
                .await;
        }

        let mut opts = options();
        opts.max_redirects = 2;

        let url = Url::parse(&format!("{}/hop0", server.uri())).unwrap();
        let outcome = fetch_url(&client(), &url, &opts).await;

        assert!(matches!(
            outcome,
            FetchOutcome::NetworkError {
                kind: NetworkErrorKind::TooManyRedirects,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut opts = options();
        opts.timeout = Duration::from_millis(200);

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let outcome = fetch_url(&client(), &url, &opts).await;

        assert!(matches!(outcome, FetchOutcome::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let outcome = fetch_url(&client(), &url, &options()).await;

        assert!(matches!(
            outcome,
            FetchOutcome::NetworkError {
                kind: NetworkErrorKind::ConnectionRefused,
                ..
            }
        ));
    }
}
