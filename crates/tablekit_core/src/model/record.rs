//! Record domain model.
//!
//! # Responsibility
//! - Define the canonical row shape (`id`, `name`, `email`).
//! - Define the `TableRecord` contract that binds a Rust type to a table.
//!
//! # Invariants
//! - `id` is assigned by the store and never sent on insert.
//! - `name` and `email` must be non-blank before persistence.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier (`INTEGER PRIMARY KEY AUTOINCREMENT`).
pub type RecordId = i64;

/// Validation failures for record writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// `name` is empty or whitespace only.
    EmptyName,
    /// `email` is empty or whitespace only.
    EmptyEmail,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "record name cannot be empty"),
            Self::EmptyEmail => write!(f, "record email cannot be empty"),
        }
    }
}

impl Error for RecordValidationError {}

/// Row shape bound to an accessor at compile time.
///
/// Implementors are built positionally from `(id, name, email)` when rows are
/// read back, and expose `name`/`email` for writes.
pub trait TableRecord {
    /// Builds one instance from the stored column values.
    fn from_columns(id: RecordId, name: String, email: String) -> Self;

    fn name(&self) -> &str;

    fn email(&self) -> &str;

    /// Checks write-side invariants before any SQL is issued.
    fn validate(&self) -> Result<(), RecordValidationError> {
        validate_columns(self.name(), self.email())
    }
}

/// Default record shape for a `(id, name, email)` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Zero until the store assigns a real id.
    pub id: RecordId,
    pub name: String,
    /// Unique across the table.
    pub email: String,
}

impl Record {
    /// Creates an unsaved record. The store assigns `id` on insert.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(0, name, email)
    }

    /// Creates a record with a known id, typically read back from the store.
    pub fn with_id(id: RecordId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl TableRecord for Record {
    fn from_columns(id: RecordId, name: String, email: String) -> Self {
        Self { id, name, email }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

fn validate_columns(name: &str, email: &str) -> Result<(), RecordValidationError> {
    if name.trim().is_empty() {
        return Err(RecordValidationError::EmptyName);
    }
    if email.trim().is_empty() {
        return Err(RecordValidationError::EmptyEmail);
    }
    Ok(())
}
