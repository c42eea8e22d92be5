//! Summary of a finished crawl

use std::fmt;
use std::time::Duration;

/// Why the orchestrator stopped dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Frontier empty with nothing in flight
    FrontierExhausted,

    /// The visited count reached the configured cap
    MaxPagesReached,

    /// The stop token was cancelled
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::MaxPagesReached => "page limit reached",
            Self::Cancelled => "stop requested",
        };
        write!(f, "{}", text)
    }
}

/// Counters collected once every in-flight task has drained
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    /// URLs that completed fetch, parse and persist
    pub visited: usize,

    /// Crawl tasks started, retries included
    pub dispatched: u64,

    /// Attempts that ended in an error, retried or not
    pub failed_attempts: u64,

    /// URLs given up on, in order
    pub abandoned: Vec<String>,

    /// URLs still queued when the crawl stopped
    pub remaining_in_frontier: usize,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.visited as f64 / secs
    }
}
