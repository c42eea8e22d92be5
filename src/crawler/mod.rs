//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML text and link extraction behind the `Parser` trait
//! - The shared crawl ledger (frontier, visited, in-flight, retries)
//! - Bounded-concurrency crawl orchestration

mod coordinator;
mod fetcher;
mod ledger;
mod parser;
mod report;
mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::Orchestrator;
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use ledger::{
    AbandonReason, CrawlState, Dispatch, FrontierHandle, LedgerSnapshot, Resolution, RetryPolicy,
    WorkRecord,
};
pub use parser::{parse_html, HtmlParser, ParsedPage, Parser};
pub use report::{CrawlReport, StopReason};
pub use task::{host_of, CrawlTask};

use crate::config::Config;
use crate::SilkwormError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the SQLite database and create the page table
/// 2. Build the HTTP client
/// 3. Queue the configured seeds
/// 4. Dispatch crawl tasks until the crawl stops
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished
/// * `Err(SilkwormError)` - Setup failed
///
/// # Example
///
/// ```no_run
/// use silkworm::config::load_config;
/// use silkworm::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("silkworm.toml"))?;
/// let report = crawl(config).await?;
/// println!("{} pages visited", report.visited);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlReport, SilkwormError> {
    let orchestrator = Orchestrator::from_config(&config)?;
    Ok(orchestrator.run().await)
}
