//! State module for tracking crawl progress
//!
//! This module provides the data structures the orchestrator owns during a crawl.
//!
//! # Components
//!
//! - `FrontierQueue`: FIFO of URLs waiting for dispatch, with doubling/halving storage
//! - `VisitedSet`: URLs whose crawl completed successfully
//! - `UrlState`: Lifecycle of a single URL (discovered, queued, dispatched, visited, abandoned)

mod queue;
mod url_state;
mod visited;

// Re-export main types
pub use queue::FrontierQueue;
pub use url_state::UrlState;
pub use visited::VisitedSet;
