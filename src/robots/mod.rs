//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Fetching is fail-open: a missing or broken robots.txt never blocks the crawl.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use crate::crawler::{fetch_url, FetchOptions, FetchOutcome};
use reqwest::Client;
use std::num::NonZeroUsize;
use std::time::Duration;
use url::Url;

/// Redirect hops followed for robots.txt (http to https, apex to www)
const ROBOTS_MAX_REDIRECTS: usize = 5;

/// Largest robots.txt body read; the rest is ignored
const ROBOTS_MAX_BYTES: usize = 512 * 1024;

/// Fetches and parses `<origin>/robots.txt`
///
/// Redirects are followed up to [`ROBOTS_MAX_REDIRECTS`] hops. Any failure
/// (network error, timeout, redirect error, final non-2xx status) yields
/// [`ParsedRobots::allow_all`].
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - Serialized origin, e.g. `https://example.com`
/// * `user_agent` - The user agent string to send
/// * `timeout` - Timeout for each request
pub async fn fetch_robots(
    client: &Client,
    origin: &str,
    user_agent: &str,
    timeout: Duration,
) -> ParsedRobots {
    let robots_url = match Url::parse(&format!("{}/robots.txt", origin.trim_end_matches('/'))) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Invalid robots.txt URL for {}: {}; allowing all", origin, e);
            return ParsedRobots::allow_all();
        }
    };

    let options = FetchOptions {
        user_agent: user_agent.to_string(),
        timeout,
        max_response_size: NonZeroUsize::new(ROBOTS_MAX_BYTES),
        max_redirects: ROBOTS_MAX_REDIRECTS,
    };

    match fetch_url(client, &robots_url, &options).await {
        FetchOutcome::Success {
            status_code,
            body,
            final_url,
            redirect_chain,
            ..
        } => {
            if !(200..300).contains(&status_code) {
                tracing::debug!(
                    "robots.txt for {} returned HTTP {}; allowing all",
                    origin,
                    status_code
                );
                return ParsedRobots::allow_all();
            }
            if !redirect_chain.is_empty() {
                tracing::debug!("robots.txt for {} served from {}", origin, final_url);
            }
            ParsedRobots::from_content(&String::from_utf8_lossy(&body))
        }
        FetchOutcome::NetworkError { kind, message, .. } => {
            tracing::debug!(
                "robots.txt fetch failed for {} ({}): {}; allowing all",
                origin,
                kind,
                message
            );
            ParsedRobots::allow_all()
        }
        FetchOutcome::Timeout { .. } => {
            tracing::warn!("robots.txt fetch timed out for {}; allowing all", origin);
            ParsedRobots::allow_all()
        }
    }
}
