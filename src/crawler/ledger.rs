//! Crawl ledger - the single critical section of a crawl
//!
//! The frontier, the visited set, the in-flight markers and the per-URL
//! attempt counters all live in one `CrawlState` behind one mutex. Every
//! compound operation (pop + visited check + in-flight mark, completion +
//! requeue) is a single method, so no check can be separated from the
//! mutation it guards.
//!
//! `FrontierHandle` is the cloneable view crawl tasks and the orchestrator
//! share. It never holds the lock across an `.await`.

use crate::state::{FrontierQueue, UrlState, VisitedSet};
use crate::CrawlError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// How many times a URL may be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retries forever
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Allows at most `max_attempts` dispatches per URL (values below 1 are raised to 1)
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Builds a policy from the config convention where 0 means unbounded
    pub fn from_config(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            Self::unbounded()
        } else {
            Self::bounded(max_attempts)
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns true if a URL that has been dispatched `attempts` times may go again
    pub fn allows_retry(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::bounded(3)
    }
}

/// Result of one crawl attempt, consumed once by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    /// The URL as it was dispatched
    pub url: String,

    /// `Ok` if fetch, parse and persist all succeeded
    pub outcome: Result<(), CrawlError>,
}

impl WorkRecord {
    pub fn succeeded(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(()),
        }
    }

    pub fn failed(url: impl Into<String>, error: CrawlError) -> Self {
        Self {
            url: url.into(),
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// A URL claimed for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub url: String,

    /// 1 for the first dispatch of this URL
    pub attempt: u32,
}

/// Why a failed URL is not going back to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The retry policy's attempt limit was reached
    AttemptsExhausted,

    /// The error can never succeed for this URL
    Unretryable,
}

/// What the ledger did with a completed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Marked visited
    Visited,

    /// Put back at the tail of the frontier
    Requeued { attempt: u32 },

    /// Dropped for good
    Abandoned { reason: AbandonReason },

    /// Blank URL; nothing to retry against
    Dropped,

    /// Another attempt already completed this URL
    AlreadyVisited,
}

/// Frontier, visited set and in-flight tracking for one crawl
#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: FrontierQueue<String>,
    visited: VisitedSet,
    in_flight: HashSet<String>,
    attempts: HashMap<String, u32>,
    abandoned: HashSet<String>,
    abandoned_order: Vec<String>,
    failed_attempts: u64,
    retry: RetryPolicy,
}

impl CrawlState {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..Self::default()
        }
    }

    /// Appends URLs to the frontier in order; duplicates are kept
    pub fn enqueue<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.frontier.enqueue_all(
            urls.into_iter()
                .inspect(|url| Self::transition(url, UrlState::Discovered, UrlState::Queued)),
        )
    }

    /// Pops URLs until one is eligible, marks it in flight and returns it
    ///
    /// Visited, in-flight and abandoned URLs are discarded on the way.
    /// Returns `None` once the frontier is empty.
    pub fn claim_next(&mut self) -> Option<Dispatch> {
        while let Some(url) = self.frontier.dequeue() {
            if self.visited.contains(&url) {
                tracing::trace!("Discarding {}: already visited", url);
                continue;
            }
            if self.in_flight.contains(&url) {
                tracing::trace!("Discarding {}: already in flight", url);
                continue;
            }
            if self.abandoned.contains(&url) {
                tracing::trace!("Discarding {}: abandoned", url);
                continue;
            }

            let attempt = {
                let count = self.attempts.entry(url.clone()).or_insert(0);
                *count += 1;
                *count
            };
            Self::transition(&url, UrlState::Queued, UrlState::Dispatched);
            self.in_flight.insert(url.clone());

            return Some(Dispatch { url, attempt });
        }

        None
    }

    /// Applies a completed attempt: clears the in-flight marker, then marks
    /// visited, requeues or abandons the URL
    pub fn resolve(&mut self, record: &WorkRecord) -> Resolution {
        let from = if self.in_flight.remove(&record.url) {
            UrlState::Dispatched
        } else {
            self.state_of(&record.url).unwrap_or(UrlState::Discovered)
        };

        let error = match &record.outcome {
            Ok(()) => {
                self.attempts.remove(&record.url);
                if self.visited.contains(&record.url) {
                    return Resolution::AlreadyVisited;
                }
                Self::transition(&record.url, from, UrlState::Visited);
                self.visited.mark(&record.url);
                return Resolution::Visited;
            }
            Err(error) => error,
        };

        self.failed_attempts += 1;

        if record.url.trim().is_empty() {
            self.attempts.remove(&record.url);
            return Resolution::Dropped;
        }

        if self.visited.contains(&record.url) {
            self.attempts.remove(&record.url);
            return Resolution::AlreadyVisited;
        }

        if !error.is_retryable() {
            Self::transition(&record.url, from, UrlState::Abandoned);
            self.abandon(&record.url);
            return Resolution::Abandoned {
                reason: AbandonReason::Unretryable,
            };
        }

        let attempts = self.attempts.get(&record.url).copied().unwrap_or(0);
        if !self.retry.allows_retry(attempts) {
            Self::transition(&record.url, from, UrlState::Abandoned);
            self.abandon(&record.url);
            return Resolution::Abandoned {
                reason: AbandonReason::AttemptsExhausted,
            };
        }

        Self::transition(&record.url, from, UrlState::Queued);
        self.frontier.enqueue(record.url.clone());
        Resolution::Requeued {
            attempt: attempts + 1,
        }
    }

    /// Checks one lifecycle move against the `UrlState` transition table
    fn transition(url: &str, from: UrlState, to: UrlState) {
        debug_assert!(
            from.can_transition_to(to),
            "illegal transition for {}: {} -> {}",
            url,
            from,
            to
        );
        tracing::trace!("{}: {} -> {}", url, from, to);
    }

    fn abandon(&mut self, url: &str) {
        self.attempts.remove(url);
        if self.abandoned.insert(url.to_string()) {
            self.abandoned_order.push(url.to_string());
        }
    }

    /// Where `url` currently is in its lifecycle, or `None` if never seen
    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        if self.visited.contains(url) {
            Some(UrlState::Visited)
        } else if self.in_flight.contains(url) {
            Some(UrlState::Dispatched)
        } else if self.abandoned.contains(url) {
            Some(UrlState::Abandoned)
        } else if self.frontier.iter().any(|queued| queued == url) {
            Some(UrlState::Queued)
        } else {
            None
        }
    }

    pub fn frontier(&self) -> &FrontierQueue<String> {
        &self.frontier
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Abandoned URLs in the order they were given up on
    pub fn abandoned(&self) -> &[String] {
        &self.abandoned_order
    }

    /// Total failed attempts, including ones that were requeued
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts
    }
}

/// Point-in-time counters taken under the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub queued: usize,
    pub in_flight: usize,
    pub visited: usize,
    pub abandoned: usize,
    pub failed_attempts: u64,
}

/// Shared, cloneable access to a `CrawlState`
///
/// Enqueues wake whoever is waiting in [`FrontierHandle::notified`].
#[derive(Debug, Clone)]
pub struct FrontierHandle {
    state: Arc<Mutex<CrawlState>>,
    notify: Arc<Notify>,
}

impl FrontierHandle {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(CrawlState::new(retry))),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Appends URLs to the frontier and wakes the dispatcher
    ///
    /// Returns how many URLs were appended.
    pub fn push<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let added = self.lock().enqueue(urls);
        if added > 0 {
            self.notify.notify_one();
        }
        added
    }

    /// Atomically claims the next eligible URL
    pub fn claim_next(&self) -> Option<Dispatch> {
        self.lock().claim_next()
    }

    /// Atomically applies a completed attempt
    pub fn resolve(&self, record: &WorkRecord) -> Resolution {
        let resolution = self.lock().resolve(record);
        if matches!(resolution, Resolution::Requeued { .. }) {
            self.notify.notify_one();
        }
        resolution
    }

    /// Completes when something was pushed since the last wake-up
    pub async fn notified(&self) {
        self.notify.notified().await
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            queued: state.frontier.len(),
            in_flight: state.in_flight.len(),
            visited: state.visited.len(),
            abandoned: state.abandoned_order.len(),
            failed_attempts: state.failed_attempts,
        }
    }

    pub fn frontier_len(&self) -> usize {
        self.lock().frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.lock().visited.contains(url)
    }

    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        self.lock().state_of(url)
    }

    pub fn abandoned(&self) -> Vec<String> {
        self.lock().abandoned().to_vec()
    }

    /// Copies the queued URLs, head first
    pub fn queued_urls(&self) -> Vec<String> {
        self.lock().frontier.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, CrawlState> {
        // Every mutation completes before the guard drops, so a poisoned
        // state is still consistent
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
