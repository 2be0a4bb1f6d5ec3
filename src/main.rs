//! Smoke crawler main entry point
//!
//! This is the command-line interface for the HTTP smoke test crawler.

use anyhow::{Context, Result};
use clap::Parser;
use smoke_crawler::config::{
    build_crawler_configuration, build_output_configuration, email_configuration_from_env,
    load_file_config, split_trimmed, validate_email, validate_email_configuration, CrawlerSection,
    EmailConfiguration, FileConfig, OutputSection,
};
use smoke_crawler::crawler::crawl;
use smoke_crawler::email::{send_report_email, SmtpMailer};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Smoke crawler: find easily broken links in a website
///
/// Crawls a site from a base URL within the given limits and reports every
/// URL it attempted. Broken links are reported, not signalled through the
/// exit status.
#[derive(Parser, Debug)]
#[command(name = "smoke-crawler")]
#[command(version = "1.0.0")]
#[command(about = "HTTP smoke test crawler", long_about = None)]
struct Cli {
    /// Base URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Comma-separated output sinks: [text:|markdown:|json:]stdout|stderr|PATH
    #[arg(short, long, value_name = "LIST")]
    output: Option<String>,

    /// Honor robots.txt rules and Crawl-delay
    #[arg(long, alias = "respectRobots")]
    respect_robots: bool,

    /// Minimum delay between requests, in milliseconds
    #[arg(long, alias = "delayBetweenRequests", value_name = "MS")]
    delay_between_requests: Option<u64>,

    /// Do not follow links marked rel="nofollow"
    #[arg(long, alias = "rejectNoFollowLinks")]
    reject_no_follow_links: bool,

    /// User agent for requests and robots.txt matching
    #[arg(long, alias = "userAgent", value_name = "UA")]
    user_agent: Option<String>,

    /// Maximum number of URLs to crawl, base URL included
    #[arg(long, alias = "maxCrawlCount", value_name = "N")]
    max_crawl_count: Option<u64>,

    /// Maximum link depth; the base URL is depth 0
    #[arg(long, alias = "maxCrawlDepth", value_name = "N")]
    max_crawl_depth: Option<u32>,

    /// Truncate response bodies beyond this many bytes
    #[arg(long, alias = "maxResponseSize", value_name = "BYTES")]
    max_response_size: Option<u64>,

    /// Comma-separated filter expressions (-exclude, +include, status:CLASS, substring)
    #[arg(long, value_name = "LIST")]
    filters: Option<String>,

    /// Comma-separated recipients of the email report
    #[arg(long, value_name = "LIST")]
    emails: Option<String>,

    /// Number of concurrent fetch workers
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Cancel the whole run after this many seconds
    #[arg(long, alias = "runTimeout", value_name = "SECS")]
    run_timeout: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Crawler values given on the command line
    fn crawler_section(&self) -> CrawlerSection {
        CrawlerSection {
            delay_between_requests: self.delay_between_requests,
            respect_robots: self.respect_robots.then_some(true),
            reject_no_follow_links: self.reject_no_follow_links.then_some(true),
            user_agent: self.user_agent.clone(),
            maximum_crawl_count: self.max_crawl_count,
            maximum_crawl_depth: self.max_crawl_depth,
            maximum_response_size: self.max_response_size,
            concurrency: self.concurrency,
            request_timeout: self.timeout,
            robots_timeout: None,
            max_redirects: None,
            run_timeout: self.run_timeout,
        }
    }

    /// Output values given on the command line
    fn output_section(&self) -> OutputSection {
        let list = |raw: &Option<String>| {
            raw.as_deref()
                .map(|s| split_trimmed(s).into_iter().collect::<Vec<_>>())
        };

        OutputSection {
            outputs: list(&self.output),
            filters: list(&self.filters),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration layers: command line over file over defaults
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_file_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let crawler_config = build_crawler_configuration(file.crawler.merge(cli.crawler_section()))
        .context("Invalid crawler configuration")?;
    let output_config = build_output_configuration(file.output.merge(cli.output_section()))
        .context("Invalid output configuration")?;

    let recipients = email_recipients(&cli, file.email.as_ref())?;
    let email_config = if recipients.is_empty() {
        None
    } else {
        Some(match file.email {
            Some(config) => {
                validate_email_configuration(&config).context("Invalid [email] configuration")?;
                config
            }
            None => email_configuration_from_env().context("Email report requested")?,
        })
    };

    let run_timeout = crawler_config.run_timeout;
    let cancel = CancellationToken::new();
    install_cancellation(cancel.clone(), run_timeout);

    tracing::info!(
        "Outputs: {}",
        output_config
            .outputs
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Run the crawler
    let report = match crawl(&cli.url, crawler_config.clone(), &output_config, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let summary = report.summary();
    tracing::info!(
        "Crawl {}: {} URLs, {} problems",
        report.status,
        summary.total,
        summary.problems()
    );

    if let Some(email_config) = email_config {
        let mailer = SmtpMailer::new(&email_config).context("Failed to set up SMTP transport")?;
        send_report_email(
            &mailer,
            &email_config.from_address,
            &recipients,
            &report,
            &crawler_config,
            &output_config,
        )
        .await
        .context("Failed to send email report")?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so a text report on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("smoke_crawler=info,warn"),
            1 => EnvFilter::new("smoke_crawler=debug,info"),
            2 => EnvFilter::new("smoke_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves and validates the report recipients
///
/// `--emails` replaces the recipients from the `[email]` table.
fn email_recipients(cli: &Cli, file_email: Option<&EmailConfiguration>) -> Result<Vec<String>> {
    let recipients: Vec<String> = match &cli.emails {
        Some(raw) => split_trimmed(raw).into_iter().collect(),
        None => file_email
            .map(|config| config.recipients.clone())
            .unwrap_or_default(),
    };

    for recipient in &recipients {
        validate_email(recipient)
            .with_context(|| format!("Invalid email recipient '{}'", recipient))?;
    }

    Ok(recipients)
}

/// Cancels the run on Ctrl-C or when the run timeout expires
fn install_cancellation(cancel: CancellationToken, run_timeout: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            on_signal.cancel();
        }
    });

    if let Some(limit) = run_timeout {
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!("Run timeout of {:?} reached, stopping crawl", limit);
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        });
    }
}
