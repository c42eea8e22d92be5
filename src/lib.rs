//! Silkworm: a concurrent web crawler
//!
//! This crate crawls the web from a set of seed URLs. A single orchestrator
//! owns the frontier of pending URLs and the set of visited ones, dispatches
//! a bounded number of concurrent crawl tasks, and retries failed attempts
//! until the frontier is exhausted.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Silkworm operations
#[derive(Debug, Error)]
pub enum SilkwormError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failure of a single crawl attempt
///
/// These never abort a crawl. The orchestrator decides, per error, whether
/// the URL goes back to the frontier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("Persist failed for {url}: {message}")]
    Persist { url: String, message: String },

    #[error("Malformed URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Crawl task for {url} panicked")]
    TaskPanicked { url: String },
}

impl CrawlError {
    /// Returns true if another attempt against the same URL could succeed
    ///
    /// A malformed URL fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl { .. })
    }
}

/// Result type alias for Silkworm operations
pub type Result<T> = std::result::Result<T, SilkwormError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single crawl stage
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Orchestrator};
pub use state::{FrontierQueue, UrlState, VisitedSet};
