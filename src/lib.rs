//! Smoke Crawler: find easily broken links in a website
//!
//! This crate implements a bounded, polite crawler that walks a site from a base
//! URL, honoring depth/count/size limits, robots.txt and nofollow rules, and
//! collects every attempted URL into an ordered report that can be written to
//! several sinks and mailed as a summary.

pub mod config;
pub mod crawler;
pub mod email;
pub mod filter;
pub mod output;
pub mod report;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-URL failures never show up here; they are recorded in the report as
/// [`report::CrawlOutcome`] values.
#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl { url: String, source: UrlError },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Email error: {0}")]
    Email(#[from] email::EmailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("Invalid sink identifier: {0}")]
    InvalidSink(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, SmokeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlerConfiguration, OutputConfiguration};
pub use crawler::{crawl, Coordinator};
pub use report::{CrawlOutcome, CrawlReport, CrawlResult};
pub use state::CrawlState;
pub use url::normalize_url;
