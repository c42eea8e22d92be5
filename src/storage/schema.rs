//! Database schema definitions
//!
//! Crawled pages go to a single append-only table whose name is
//! configurable, so the DDL is built per table rather than kept as a constant.

/// Returns true if `table` can be used as a table name
///
/// Only plain identifiers are accepted: an ASCII letter or underscore
/// followed by ASCII letters, digits or underscores.
pub fn is_valid_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quotes an identifier for use in SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL creating the pages table if it does not exist yet
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    text TEXT,
    metadata TEXT
);
"#,
        table = quote_identifier(table)
    )
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `table` - Name of the pages table
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&create_table_sql(table))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn, "pages");
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn, "pages").unwrap();
        let result = initialize_schema(&conn, "pages");

        assert!(result.is_ok());
    }

    #[test]
    fn test_table_exists_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, "crawled").unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                ["crawled"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "Table crawled should exist");
    }

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("pages"));
        assert!(is_valid_table_name("_pages"));
        assert!(is_valid_table_name("pages_2024"));

        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2024_pages"));
        assert!(!is_valid_table_name("pages table"));
        assert!(!is_valid_table_name("pages\";--"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("pages"), "\"pages\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
