//! Crawl frontier
//!
//! This module handles:
//! - FIFO queue of pending crawl tasks (breadth-first by depth)
//! - Level gating: no task is handed out while a shallower one is in flight
//! - The visited set, marked at push time
//! - Depth and count limits enforced at push time

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use url::Url;

/// A URL waiting to be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL
    pub url: Url,

    /// Link distance from the base URL
    pub depth: u32,

    /// Acceptance order, starting at 0 for the base URL
    pub sequence: u64,

    /// Page the URL was discovered on
    pub parent: Option<String>,
}

/// What happened to a pushed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Queued; carries the assigned sequence number
    Accepted(u64),
    /// Already queued or processed in this run
    Duplicate,
    /// Deeper than the depth limit
    TooDeep,
    /// The count budget is exhausted
    LimitReached,
}

/// Frontier owns the pending tasks and the visited set
///
/// Owned by the coordinator, so every push is a single check-and-insert with
/// no other party able to interleave.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    /// Popped but not yet completed tasks, per depth
    in_flight: BTreeMap<u32, usize>,
    accepted: u64,
    max_depth: Option<u32>,
    max_count: Option<NonZeroUsize>,
}

impl Frontier {
    /// Creates an empty frontier with the given limits
    pub fn new(max_depth: Option<u32>, max_count: Option<NonZeroUsize>) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            in_flight: BTreeMap::new(),
            accepted: 0,
            max_depth,
            max_count,
        }
    }

    /// Offers a URL to the frontier
    ///
    /// Rejections are silent drops; the outcome is only informational.
    pub fn push(&mut self, url: Url, depth: u32, parent: Option<String>) -> PushOutcome {
        if self.max_depth.is_some_and(|max| depth > max) {
            return PushOutcome::TooDeep;
        }

        if self.visited.contains(url.as_str()) {
            return PushOutcome::Duplicate;
        }

        if self.budget_exhausted() {
            return PushOutcome::LimitReached;
        }

        self.visited.insert(url.to_string());

        let sequence = self.accepted;
        self.accepted += 1;

        tracing::trace!("Queued {} at depth {} (#{})", url, depth, sequence);
        self.queue.push_back(CrawlTask {
            url,
            depth,
            sequence,
            parent,
        });

        PushOutcome::Accepted(sequence)
    }

    /// Takes the oldest pending task if its depth level may start
    ///
    /// Returns `None` while a shallower task is still in flight, even if the
    /// queue is not empty. Every depth-N page is therefore finished before
    /// any depth-N+1 page starts, and each URL is first pushed at its
    /// shortest link distance from the base URL. Pair every popped task with
    /// a [`Frontier::complete`] call.
    pub fn pop(&mut self) -> Option<CrawlTask> {
        let head = self.queue.front()?;
        if self
            .in_flight
            .keys()
            .next()
            .is_some_and(|&shallowest| head.depth > shallowest)
        {
            return None;
        }

        let task = self.queue.pop_front()?;
        *self.in_flight.entry(task.depth).or_insert(0) += 1;
        Some(task)
    }

    /// Marks a task popped at `depth` as finished
    pub fn complete(&mut self, depth: u32) {
        if let Some(count) = self.in_flight.get_mut(&depth) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(&depth);
            }
        }
    }

    /// Forgets every in-flight task
    ///
    /// For when no worker is running but some completions were never
    /// reported, e.g. after a worker panicked.
    pub fn reset_in_flight(&mut self) {
        self.in_flight.clear();
    }

    /// Number of popped tasks not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.values().sum()
    }

    /// Returns true once `maximumCrawlCount` tasks have been accepted
    pub fn budget_exhausted(&self) -> bool {
        self.max_count
            .is_some_and(|max| self.accepted >= max.get() as u64)
    }

    /// Returns true if the URL has been accepted in this run
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of tasks ever accepted
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
}
