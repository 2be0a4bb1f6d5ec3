//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Normalizing the base URL and seeding the frontier
//! - Dispatching fetch workers up to the configured concurrency
//! - Applying nofollow, scope and dedup rules to discovered links
//! - Accumulating results and finalizing the report
//!
//! The coordinator is the only owner of the frontier and the report builder.
//! Workers receive a task, do the robots check, pacing, fetch and link
//! extraction, and hand everything back; they never touch shared crawl state
//! except the robots cache and the pacer.

use crate::config::{CrawlerConfiguration, OutputConfiguration};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchOptions, FetchOutcome};
use crate::crawler::frontier::{CrawlTask, Frontier, PushOutcome};
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::{extract_links, ExtractedLink};
use crate::report::{CrawlOutcome, CrawlReport, CrawlResult, ReportBuilder, SkipReason};
use crate::robots::RobotsCache;
use crate::state::CrawlState;
use crate::url::{normalize_url, Scope};
use crate::SmokeError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Number of processed URLs between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Main crawler coordinator structure
///
/// One coordinator can run several independent crawls; everything mutable is
/// created per run inside [`Coordinator::run`].
pub struct Coordinator {
    config: Arc<CrawlerConfiguration>,
    client: Client,
}

/// Per-run state shared with workers
struct RunContext {
    config: Arc<CrawlerConfiguration>,
    client: Client,
    options: FetchOptions,
    robots: Option<RobotsCache>,
    pacer: Pacer,
    cancel: CancellationToken,
}

/// What a worker hands back to the coordinator
struct ProcessedTask {
    task: CrawlTask,
    outcome: CrawlOutcome,
    redirect_chain: Vec<String>,
    response_time_ms: u64,
    links: Vec<ExtractedLink>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration, read-only for every run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SmokeError)` - The HTTP client could not be built
    pub fn new(config: CrawlerConfiguration) -> Result<Self, SmokeError> {
        let client = build_http_client(&config)?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &CrawlerConfiguration {
        &self.config
    }

    /// Runs one crawl from `base_url`
    ///
    /// This is the core crawling logic that:
    /// 1. Normalizes the base URL (failure → `InvalidBaseUrl`, state `Aborted`)
    /// 2. Seeds the frontier with the base URL at depth 0
    /// 3. Keeps up to `concurrency` workers busy until the frontier drains,
    ///    one depth level at a time
    /// 4. Feeds discovered links back into the frontier
    /// 5. Finalizes the report as `Completed`, or `Aborted` if cancelled
    ///
    /// Cancellation stops dispatch immediately; in-flight workers return
    /// without a result and everything recorded so far is kept.
    pub async fn run(
        &self,
        base_url: &str,
        output: &OutputConfiguration,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, SmokeError> {
        let mut state = CrawlState::Idle;

        let base = match normalize_url(base_url, None) {
            Ok(url) => url,
            Err(source) => {
                state = state.transition(CrawlState::Aborted)?;
                tracing::error!("Crawl {}: invalid base URL '{}': {}", state, base_url, source);
                return Err(SmokeError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    source,
                });
            }
        };

        let scope = Scope::new(&base, output.filters.clone());
        let mut frontier = Frontier::new(
            self.config.maximum_crawl_depth,
            self.config.maximum_crawl_count,
        );
        let mut report = ReportBuilder::new(base.as_str());

        frontier.push(base.clone(), 0, None);
        state = state.transition(CrawlState::Running)?;

        tracing::info!(
            "Starting crawl of {} (concurrency {}, depth {}, count {})",
            base,
            self.config.concurrency,
            self.config
                .maximum_crawl_depth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
            self.config
                .maximum_crawl_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
        );

        let ctx = Arc::new(self.run_context(cancel.clone()));
        let mut workers: JoinSet<(u32, Option<ProcessedTask>)> = JoinSet::new();

        let start_time = Instant::now();
        let mut processed: u64 = 0;
        let mut interrupted: u64 = 0;

        loop {
            if workers.is_empty() {
                // Nothing is running, so no level can still be in flight
                frontier.reset_in_flight();
            }

            while workers.len() < self.config.concurrency && !cancel.is_cancelled() {
                let Some(task) = frontier.pop() else {
                    break;
                };
                tracing::debug!("Dispatching {} (depth {})", task.url, task.depth);

                let depth = task.depth;
                let ctx = Arc::clone(&ctx);
                workers.spawn(async move { (depth, process_task(ctx, task).await) });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };

            match joined {
                Ok((depth, Some(done))) => {
                    frontier.complete(depth);
                    let result = self.absorb(done, &scope, &mut frontier);
                    report.record(result);
                    processed += 1;

                    if processed % PROGRESS_INTERVAL == 0 {
                        let elapsed = start_time.elapsed();
                        let rate = processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                        tracing::info!(
                            "Progress: {} URLs processed, {} in frontier, {} in flight, {:.2} pages/sec",
                            processed,
                            frontier.len(),
                            workers.len(),
                            rate
                        );
                    }
                }
                Ok((depth, None)) => {
                    frontier.complete(depth);
                    interrupted += 1;
                }
                Err(e) => {
                    interrupted += 1;
                    tracing::error!("Fetch worker failed: {}", e);
                }
            }
        }

        let cut_short = cancel.is_cancelled() && (interrupted > 0 || !frontier.is_empty());
        let final_state = if cut_short {
            tracing::warn!(
                "Crawl cancelled: {} URLs processed, {} pending, {} interrupted",
                processed,
                frontier.len(),
                interrupted
            );
            CrawlState::Aborted
        } else {
            CrawlState::Completed
        };
        state = state.transition(final_state)?;

        tracing::info!(
            "Crawl {}: {} URLs processed in {:?}",
            state,
            processed,
            start_time.elapsed()
        );

        Ok(report.finish(state))
    }

    fn run_context(&self, cancel: CancellationToken) -> RunContext {
        let robots = self.config.respect_robots.then(|| {
            RobotsCache::new(
                self.client.clone(),
                &self.config.user_agent,
                self.config.robots_timeout,
            )
        });

        RunContext {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            options: FetchOptions::from_config(&self.config),
            robots,
            pacer: Pacer::new(),
            cancel,
        }
    }

    /// Turns a worker's output into a result and enqueues eligible links
    ///
    /// For each extracted link, in document order:
    /// 1. Normalize (unparseable links are dropped)
    /// 2. Record it as discovered
    /// 3. Drop it if it is `nofollow` and `reject_no_follow_links` is set
    /// 4. Drop it if it is out of scope
    /// 5. Push it at `depth + 1`; the frontier applies dedup and limits
    fn absorb(&self, done: ProcessedTask, scope: &Scope, frontier: &mut Frontier) -> CrawlResult {
        let ProcessedTask {
            task,
            outcome,
            redirect_chain,
            response_time_ms,
            links,
        } = done;

        let page_url = task.url.to_string();
        let mut discovered_links = Vec::with_capacity(links.len());

        for link in links {
            let normalized = match normalize_url(link.url.as_str(), None) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Dropping link {} on {}: {}", link.url, page_url, e);
                    continue;
                }
            };
            discovered_links.push(normalized.to_string());

            if link.nofollow && self.config.reject_no_follow_links {
                tracing::debug!("Not following nofollow link {}", normalized);
                continue;
            }

            if !scope.in_scope(&normalized) {
                tracing::trace!("Out of scope: {}", normalized);
                continue;
            }

            match frontier.push(normalized, task.depth + 1, Some(page_url.clone())) {
                PushOutcome::Accepted(sequence) => {
                    tracing::trace!("Accepted link #{} from {}", sequence, page_url);
                }
                PushOutcome::LimitReached => {
                    tracing::trace!("Crawl count budget exhausted");
                }
                PushOutcome::Duplicate | PushOutcome::TooDeep => {}
            }
        }

        tracing::debug!("{} -> {}", page_url, outcome.label());

        CrawlResult {
            url: page_url,
            depth: task.depth,
            sequence: task.sequence,
            parent: task.parent,
            outcome,
            redirect_chain,
            response_time_ms,
            discovered_links,
        }
    }
}

/// Processes a single task on a worker
///
/// This method:
/// 1. Checks robots.txt (when enabled), recording `Skipped` on denial
/// 2. Waits for a pacing slot, honoring any robots.txt `Crawl-delay`
/// 3. Fetches the page
/// 4. Extracts links from HTML responses
///
/// Returns `None` if the run is cancelled before the fetch completes.
async fn process_task(ctx: Arc<RunContext>, task: CrawlTask) -> Option<ProcessedTask> {
    if ctx.cancel.is_cancelled() {
        return None;
    }

    let mut interval = ctx.config.delay_between_requests;

    if let Some(robots) = &ctx.robots {
        let policy = tokio::select! {
            _ = ctx.cancel.cancelled() => return None,
            policy = robots.policy_for(&task.url) => policy,
        };

        if !policy.is_allowed(task.url.as_str(), &ctx.config.user_agent) {
            tracing::info!("URL {} disallowed by robots.txt", task.url);
            return Some(ProcessedTask {
                task,
                outcome: CrawlOutcome::Skipped {
                    reason: SkipReason::RobotsDenied,
                },
                redirect_chain: Vec::new(),
                response_time_ms: 0,
                links: Vec::new(),
            });
        }

        if let Some(delay) = policy
            .crawl_delay(&ctx.config.user_agent)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            interval = interval.max(delay);
        }
    }

    tokio::select! {
        _ = ctx.cancel.cancelled() => return None,
        _ = ctx.pacer.wait(interval) => {}
    }

    let started = Instant::now();
    let fetched = tokio::select! {
        _ = ctx.cancel.cancelled() => return None,
        fetched = fetch_url(&ctx.client, &task.url, &ctx.options) => fetched,
    };
    let response_time_ms = started.elapsed().as_millis() as u64;
    let content_type = fetched.content_type().map(str::to_string);

    let (outcome, redirect_chain, links) = match fetched {
        FetchOutcome::Success {
            status_code,
            body,
            truncated,
            final_url,
            redirect_chain,
            ..
        } => {
            let links = extract_links(&body, content_type.as_deref(), &final_url);

            if truncated {
                tracing::debug!("Body of {} truncated", task.url);
            }

            (
                CrawlOutcome::Success {
                    status_code,
                    content_type,
                    final_url: final_url.to_string(),
                    truncated,
                },
                redirect_chain,
                links,
            )
        }
        FetchOutcome::NetworkError {
            kind,
            message,
            redirect_chain,
        } => {
            tracing::debug!("Network error for {}: {}", task.url, message);
            (
                CrawlOutcome::NetworkError { kind, message },
                redirect_chain,
                Vec::new(),
            )
        }
        FetchOutcome::Timeout { redirect_chain } => {
            tracing::debug!("Timeout fetching {}", task.url);
            (CrawlOutcome::Timeout, redirect_chain, Vec::new())
        }
    };

    Some(ProcessedTask {
        task,
        outcome,
        redirect_chain,
        response_time_ms,
        links,
    })
}
