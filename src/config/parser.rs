use crate::config::types::{
    non_zero_usize, CrawlerConfiguration, CrawlerSection, EmailConfiguration, FileConfig,
    OutputConfiguration, OutputSection, DEFAULT_OUTPUT,
};
use crate::config::validation::{validate_crawler_section, validate_email_configuration, validate_outputs};
use crate::filter::FilterSet;
use crate::ConfigError;
use std::collections::BTreeSet;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Loads and parses a configuration file from the given path
///
/// The file only supplies defaults; nothing is validated until the sections
/// are turned into runtime configurations.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use smoke_crawler::config::load_file_config;
///
/// let file = load_file_config(Path::new("smoke-test.toml")).unwrap();
/// println!("Max depth: {:?}", file.crawler.maximum_crawl_depth);
/// ```
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Splits a comma-separated option value into a trimmed, deduplicated set
///
/// Empty items are dropped, so `"a, ,b,a"` yields `{"a", "b"}`.
///
/// # Examples
///
/// ```
/// use smoke_crawler::config::split_trimmed;
///
/// let items = split_trimmed(" ops@example.com, dev@example.com ,");
/// assert_eq!(items.len(), 2);
/// assert!(items.contains("ops@example.com"));
/// ```
pub fn split_trimmed(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates a merged crawler section and converts it to a runtime configuration
pub fn build_crawler_configuration(
    section: CrawlerSection,
) -> Result<CrawlerConfiguration, ConfigError> {
    validate_crawler_section(&section)?;

    let defaults = CrawlerConfiguration::default();

    Ok(CrawlerConfiguration {
        delay_between_requests: section
            .delay_between_requests
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay_between_requests),
        respect_robots: section.respect_robots.unwrap_or(defaults.respect_robots),
        reject_no_follow_links: section
            .reject_no_follow_links
            .unwrap_or(defaults.reject_no_follow_links),
        user_agent: section
            .user_agent
            .map(|ua| ua.trim().to_string())
            .unwrap_or(defaults.user_agent),
        maximum_crawl_count: section.maximum_crawl_count.and_then(non_zero_usize),
        maximum_crawl_depth: section.maximum_crawl_depth,
        maximum_response_size: section.maximum_response_size.and_then(non_zero_usize),
        concurrency: section.concurrency.unwrap_or(defaults.concurrency),
        request_timeout: section
            .request_timeout
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
        robots_timeout: section
            .robots_timeout
            .map(Duration::from_secs)
            .unwrap_or(defaults.robots_timeout),
        max_redirects: section.max_redirects.unwrap_or(defaults.max_redirects),
        run_timeout: section.run_timeout.map(Duration::from_secs),
    })
}

/// Validates a merged output section and converts it to a runtime configuration
///
/// An empty or missing output list falls back to `stdout`.
pub fn build_output_configuration(
    section: OutputSection,
) -> Result<OutputConfiguration, ConfigError> {
    let mut outputs: BTreeSet<String> = section
        .outputs
        .unwrap_or_default()
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if outputs.is_empty() {
        outputs.insert(DEFAULT_OUTPUT.to_string());
    }
    validate_outputs(&outputs)?;

    let filters = FilterSet::parse(
        section
            .filters
            .unwrap_or_default()
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty()),
    )?;

    Ok(OutputConfiguration { outputs, filters })
}

/// Loads email settings from `SMTP_*` environment variables
///
/// `SMTP_HOST` is required; everything else has a default.
pub fn email_configuration_from_env() -> Result<EmailConfiguration, ConfigError> {
    let smtp_host = env::var("SMTP_HOST")
        .map_err(|_| ConfigError::Validation("SMTP_HOST must be set to send email reports".to_string()))?;

    let smtp_port = match env::var("SMTP_PORT") {
        Ok(port) => port.parse().map_err(|_| {
            ConfigError::Validation(format!("SMTP_PORT must be a valid port number, got '{}'", port))
        })?,
        Err(_) => crate::config::types::default_smtp_port(),
    };

    let config = EmailConfiguration {
        from_address: env::var("SMTP_FROM_EMAIL")
            .unwrap_or_else(|_| crate::config::types::default_from_address()),
        smtp_host,
        smtp_port,
        smtp_username: env::var("SMTP_USERNAME").ok(),
        smtp_password: env::var("SMTP_PASSWORD").ok(),
        smtp_tls: env::var("SMTP_TLS").map(|v| v == "true").unwrap_or(true),
        recipients: vec![],
    };

    validate_email_configuration(&config)?;
    Ok(config)
}
