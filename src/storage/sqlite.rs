//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of the Persister trait.

use crate::storage::schema::{initialize_schema, is_valid_table_name, quote_identifier};
use crate::storage::traits::{Persister, StorageError, StorageResult};
use crate::{CrawlError, CrawlResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite persister appending one row per crawled page
pub struct SqlitePersister {
    conn: Mutex<Connection>,
    table: String,
}

impl SqlitePersister {
    /// Opens (or creates) the database at `path` and ensures the table exists
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Name of the pages table
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePersister)` - Successfully opened/created database
    /// * `Err(StorageError)` - Invalid table name or failed to open database
    pub fn open(path: &Path, table: &str) -> StorageResult<Self> {
        if !is_valid_table_name(table) {
            return Err(StorageError::InvalidTable(table.to_string()));
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for concurrent readers while we append
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::from_connection(conn, table)
    }

    /// Creates an in-memory database
    pub fn open_in_memory(table: &str) -> StorageResult<Self> {
        if !is_valid_table_name(table) {
            return Err(StorageError::InvalidTable(table.to_string()));
        }
        Self::from_connection(Connection::open_in_memory()?, table)
    }

    fn from_connection(conn: Connection, table: &str) -> StorageResult<Self> {
        initialize_schema(&conn, table)?;
        tracing::debug!("Table {} is ready", table);

        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    /// Name of the pages table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Appends a row and returns its id
    pub fn insert(&self, url: &str, text: &str, metadata: &str) -> StorageResult<i64> {
        let conn = self.lock();
        let query = format!(
            "INSERT INTO {}(url, text, metadata) VALUES (?1, ?2, ?3)",
            quote_identifier(&self.table)
        );
        conn.execute(&query, params![url, text, metadata])?;
        Ok(conn.last_insert_rowid())
    }

    /// Counts stored pages
    pub fn count_rows(&self) -> StorageResult<u64> {
        let conn = self.lock();
        let query = format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table));
        let count: i64 = conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Counts stored pages per host, busiest host first
    pub fn count_by_host(&self) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.lock();
        let query = format!(
            "SELECT COALESCE(metadata, ''), COUNT(*) AS n FROM {}
             GROUP BY metadata ORDER BY n DESC, metadata ASC",
            quote_identifier(&self.table)
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            let host: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((host, count as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Loads stored URLs in insertion order
    pub fn load_urls(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock();
        let query = format!(
            "SELECT url FROM {} ORDER BY id ASC",
            quote_identifier(&self.table)
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut urls = Vec::new();
        for row in rows {
            urls.push(row?);
        }
        Ok(urls)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in the connection
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Persister for SqlitePersister {
    async fn save(&self, url: &str, text: &str, metadata: &str) -> CrawlResult<()> {
        match self.insert(url, text, metadata) {
            Ok(id) => {
                tracing::debug!("{} was inserted as row {}", url, id);
                Ok(())
            }
            Err(e) => Err(CrawlError::Persist {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        let storage = SqlitePersister::open_in_memory("pages");
        assert!(storage.is_ok());
    }

    #[test]
    fn test_rejects_invalid_table() {
        let result = SqlitePersister::open_in_memory("pages; DROP TABLE x");
        assert!(matches!(result, Err(StorageError::InvalidTable(_))));
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let storage = SqlitePersister::open_in_memory("pages").unwrap();
        let id1 = storage
            .insert("https://example.com/", "hello", "example.com")
            .unwrap();
        let id2 = storage
            .insert("https://example.com/a", "world", "example.com")
            .unwrap();
        assert!(id1 > 0);
        assert!(id2 > id1);
    }

    #[test]
    fn test_rows_are_appended_not_replaced() {
        let storage = SqlitePersister::open_in_memory("pages").unwrap();
        storage
            .insert("https://example.com/", "first", "example.com")
            .unwrap();
        storage
            .insert("https://example.com/", "second", "example.com")
            .unwrap();

        assert_eq!(storage.count_rows().unwrap(), 2);
        assert_eq!(
            storage.load_urls().unwrap(),
            vec!["https://example.com/", "https://example.com/"]
        );
    }

    #[test]
    fn test_count_by_host() {
        let storage = SqlitePersister::open_in_memory("pages").unwrap();
        storage.insert("https://a.com/1", "", "a.com").unwrap();
        storage.insert("https://b.com/1", "", "b.com").unwrap();
        storage.insert("https://a.com/2", "", "a.com").unwrap();

        let counts = storage.count_by_host().unwrap();
        assert_eq!(
            counts,
            vec![("a.com".to_string(), 2), ("b.com".to_string(), 1)]
        );
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.db");

        {
            let storage = SqlitePersister::open(&path, "pages").unwrap();
            storage.insert("https://example.com/", "text", "example.com").unwrap();
        }

        // Table creation is idempotent across opens
        let storage = SqlitePersister::open(&path, "pages").unwrap();
        assert_eq!(storage.count_rows().unwrap(), 1);
        assert_eq!(storage.table(), "pages");
    }

    #[tokio::test]
    async fn test_save_through_trait() {
        let storage = SqlitePersister::open_in_memory("pages").unwrap();
        let persister: &dyn Persister = &storage;

        persister
            .save("https://example.com/", "Hello world", "example.com")
            .await
            .unwrap();

        assert_eq!(storage.count_rows().unwrap(), 1);
    }
}
