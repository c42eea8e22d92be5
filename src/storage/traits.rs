//! Storage traits and error types
//!
//! This module defines the persistence capability the crawl tasks consume
//! and the errors raised by the SQLite backend.

use crate::CrawlResult;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable sink for crawled pages
///
/// Implementations create whatever schema they need on first use and must be
/// safe to call from many crawl tasks at once.
#[async_trait]
pub trait Persister: Send + Sync {
    /// Stores one crawled page
    ///
    /// # Arguments
    ///
    /// * `url` - The URL exactly as it was dispatched
    /// * `text` - Text extracted from the page
    /// * `metadata` - The URL's host (authority)
    async fn save(&self, url: &str, text: &str, metadata: &str) -> CrawlResult<()>;
}
