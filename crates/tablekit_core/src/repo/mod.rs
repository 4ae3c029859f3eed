//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the table accessor contract.
//! - Isolate SQLite statement details from callers.
//!
//! # Invariants
//! - Repository writes must enforce `TableRecord::validate()` before
//!   persistence.
//! - Store failures are returned to the caller unchanged; nothing is retried.

pub mod table_repo;
