//! SQLite persistence for suppliers, drugs, invoices, items and inventory logs.

mod catalog;
mod inventory;
mod invoices;

pub use inventory::StockReceipt;
pub use invoices::ItemMatchUpdate;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::StoreError;
use crate::models::config::DatabaseConfig;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = include_str!("schema.sql");

/// Handle to the intake database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) a database file with default settings.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(&DatabaseConfig {
            path: path.to_path_buf(),
            ..DatabaseConfig::default()
        })
    }

    /// Open the database named in the configuration.
    pub fn open_with_config(config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        debug!("Opened database {}", config.path.display());
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

/// Read a TEXT column through a domain parser.
fn parsed_column<T>(row: &Row<'_>, idx: usize, column: &str, parse: impl Fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| invalid_column(idx, column, raw))
}

fn decimal_column(row: &Row<'_>, idx: usize, column: &str) -> rusqlite::Result<Decimal> {
    parsed_column(row, idx, column, |s| Decimal::from_str(s).ok())
}

fn optional_decimal_column(row: &Row<'_>, idx: usize, column: &str) -> rusqlite::Result<Option<Decimal>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => Decimal::from_str(&raw)
            .map(Some)
            .map_err(|_| invalid_column(idx, column, raw)),
        None => Ok(None),
    }
}

fn invalid_column(idx: usize, column: &str, value: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(StoreError::InvalidColumn {
            column: column.to_string(),
            value,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db");

        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();

        let tables: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
