//! Record, field and predicate model for table access.
//!
//! # Responsibility
//! - Define the compile-time record shape bound to a table.
//! - Define the structured filter and assignment types that replace raw SQL
//!   fragments in the public API.
//!
//! # Invariants
//! - Column names only ever come from `Field::column()`.
//! - Values only ever reach SQL as bound parameters.

pub mod assignments;
pub mod field;
pub mod filter;
pub mod record;
