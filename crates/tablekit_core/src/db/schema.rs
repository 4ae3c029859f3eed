//! Accessor table naming and schema creation.
//!
//! # Invariants
//! - Table names are validated identifiers and are always double-quoted when
//!   interpolated into SQL.
//! - `ensure_table` is idempotent and never touches existing rows.

use super::DbResult;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_TABLE_NAME_CHARS: usize = 63;
const RESERVED_PREFIX: &str = "sqlite_";

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name regex"));

/// Validated SQL table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableNameError {
    Empty,
    TooLong(String),
    /// Contains characters outside `[A-Za-z0-9_]` or starts with a digit.
    InvalidCharacters(String),
    /// Uses the `sqlite_` prefix owned by SQLite internals.
    Reserved(String),
}

impl Display for TableNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "table name cannot be empty"),
            Self::TooLong(name) => write!(
                f,
                "table name `{name}` exceeds {MAX_TABLE_NAME_CHARS} characters"
            ),
            Self::InvalidCharacters(name) => write!(
                f,
                "table name `{name}` must match [A-Za-z_][A-Za-z0-9_]*"
            ),
            Self::Reserved(name) => write!(f, "table name `{name}` uses a reserved prefix"),
        }
    }
}

impl Error for TableNameError {}

impl TableName {
    pub fn parse(value: &str) -> Result<Self, TableNameError> {
        if value.is_empty() {
            return Err(TableNameError::Empty);
        }
        if value.chars().count() > MAX_TABLE_NAME_CHARS {
            return Err(TableNameError::TooLong(value.to_string()));
        }
        if !TABLE_NAME_RE.is_match(value) {
            return Err(TableNameError::InvalidCharacters(value.to_string()));
        }
        if value.to_ascii_lowercase().starts_with(RESERVED_PREFIX) {
            return Err(TableNameError::Reserved(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier form for SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates the `(id, name, email)` table when absent.
pub fn ensure_table(conn: &Connection, table: &TableName) -> DbResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE
        );",
        table.quoted()
    ))?;
    Ok(())
}

/// Returns whether `table` exists in the connected store.
pub fn table_exists(conn: &Connection, table: &TableName) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
