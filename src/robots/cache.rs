//! Per-run robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per crawl run, even when
//! several workers ask for the same host at the same time.

use crate::robots::{fetch_robots, ParsedRobots};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

type Slot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Robots.txt policies keyed by origin (`scheme://host:port`)
///
/// Owned by a single crawl run and dropped with it.
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    timeout: Duration,
    entries: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates an empty cache that fetches with the given client
    pub fn new(client: Client, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
            timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the policy for the URL's origin, fetching it on first use
    ///
    /// Concurrent callers for the same origin wait on a single fetch.
    pub async fn policy_for(&self, url: &Url) -> Arc<ParsedRobots> {
        let origin = url.origin().ascii_serialization();

        let slot = {
            let mut entries = match self.entries.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries.entry(origin.clone()).or_default().clone()
        };

        slot.get_or_init(|| async {
            tracing::debug!("Fetching robots.txt for {}", origin);
            Arc::new(fetch_robots(&self.client, &origin, &self.user_agent, self.timeout).await)
        })
        .await
        .clone()
    }

    /// Returns the number of origins with a cached (or in-flight) policy
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
