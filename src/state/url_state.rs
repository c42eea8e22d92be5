//! URL lifecycle states
//!
//! This module defines every state a URL can be in during a crawl and the
//! moves the crawl ledger is allowed to make between them.

use std::fmt;

/// Represents where a URL is in the crawl pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// URL was emitted by a seed or a parse but not yet queued
    Discovered,

    /// URL is sitting in the frontier waiting for dispatch
    Queued,

    /// URL is owned by a running crawl task
    Dispatched,

    // ===== Terminal States =====
    /// URL completed fetch, parse and persist
    Visited,

    /// URL failed and will not be retried
    Abandoned,
}

impl UrlState {
    /// Returns true if the lifecycle allows moving from `self` to `next`
    ///
    /// A failed attempt moves `Dispatched` back to `Queued`.
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Queued)
                | (Self::Queued, Self::Dispatched)
                | (Self::Dispatched, Self::Visited)
                | (Self::Dispatched, Self::Queued)
                | (Self::Dispatched, Self::Abandoned)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Dispatched => "dispatched",
            Self::Visited => "visited",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
