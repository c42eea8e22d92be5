//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the crawler, including:
//! - The `Persister` capability consumed by crawl tasks
//! - SQLite table initialization (idempotent, on open)
//! - Append-only page rows and simple row statistics

mod schema;
mod sqlite;
mod traits;

pub use schema::{create_table_sql, initialize_schema, is_valid_table_name};
pub use sqlite::SqlitePersister;
pub use traits::{Persister, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `table` - Name of the pages table
///
/// # Returns
///
/// * `Ok(SqlitePersister)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path, table: &str) -> StorageResult<SqlitePersister> {
    SqlitePersister::open(path, table)
}
