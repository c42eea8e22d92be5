//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer and from a finished run.

use crate::crawler::CrawlReport;
use crate::storage::{SqlitePersister, StorageResult};

/// Number of hosts listed in printed statistics
const TOP_HOSTS: usize = 10;

/// Page table statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Table the rows were read from
    pub table: String,

    /// Total number of stored pages
    pub total_pages: u64,

    /// Stored pages per host, busiest first
    pub pages_by_host: Vec<(String, u64)>,
}

impl CrawlStatistics {
    pub fn unique_hosts(&self) -> usize {
        self.pages_by_host.len()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The page table to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &SqlitePersister) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        table: storage.table().to_string(),
        total_pages: storage.count_rows()?,
        pages_by_host: storage.count_by_host()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ({}) ===\n", stats.table);

    println!("Overview:");
    println!("  Total pages stored: {}", stats.total_pages);
    println!("  Unique hosts: {}", stats.unique_hosts());
    println!();

    if stats.pages_by_host.is_empty() {
        return;
    }

    println!("Top Hosts:");
    for (host, count) in stats.pages_by_host.iter().take(TOP_HOSTS) {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        let host = if host.is_empty() { "(unknown)" } else { host.as_str() };
        println!("  {}: {} ({:.1}%)", host, count, percentage);
    }
    if stats.unique_hosts() > TOP_HOSTS {
        println!("  ... and {} more", stats.unique_hosts() - TOP_HOSTS);
    }
    println!();
}

/// Prints the summary of a finished crawl
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");

    println!("  Stopped: {}", report.stop_reason);
    println!("  Pages visited: {}", report.visited);
    println!("  Tasks dispatched: {}", report.dispatched);
    println!("  Failed attempts: {}", report.failed_attempts);
    println!("  Left in frontier: {}", report.remaining_in_frontier);
    println!(
        "  Elapsed: {:.2}s ({:.2} pages/sec)",
        report.elapsed.as_secs_f64(),
        report.pages_per_second()
    );
    println!();

    if !report.abandoned.is_empty() {
        println!("Abandoned URLs ({}):", report.abandoned.len());
        for url in &report.abandoned {
            println!("  - {}", url);
        }
        println!();
    }
}
