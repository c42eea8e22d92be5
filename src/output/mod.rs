//! Output module for crawl summaries
//!
//! This module handles:
//! - Reading statistics back from the page table
//! - Printing the report of a finished crawl

pub mod stats;

pub use stats::{load_statistics, print_report, print_statistics, CrawlStatistics};
