//! Configuration module for the smoke crawler
//!
//! This module builds the two run configurations (`CrawlerConfiguration`,
//! `OutputConfiguration`) plus the SMTP settings for the email report. Values
//! come from three layers: command line over TOML file over defaults.
//!
//! # Example
//!
//! ```no_run
//! use smoke_crawler::config::{build_crawler_configuration, load_file_config};
//! use std::path::Path;
//!
//! let file = load_file_config(Path::new("smoke-test.toml")).unwrap();
//! let config = build_crawler_configuration(file.crawler).unwrap();
//! println!("Crawler will use max depth: {:?}", config.maximum_crawl_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlerConfiguration, CrawlerSection, EmailConfiguration, FileConfig, OutputConfiguration,
    OutputSection, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    build_crawler_configuration, build_output_configuration, email_configuration_from_env,
    load_file_config, split_trimmed,
};
pub use validation::{validate_email, validate_email_configuration};
