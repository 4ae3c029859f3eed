//! Typed SQLite table access.
//!
//! Binds a record type with `(id, name, email)` columns to one named table in
//! one store file and exposes insert-or-replace, update, query and delete over
//! it using structured filters instead of SQL fragments.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::schema::{TableName, TableNameError};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::assignments::{AssignmentError, Assignments};
pub use model::field::{Field, FieldValue};
pub use model::filter::{CompareOp, Filter, FilterError};
pub use model::record::{Record, RecordId, RecordValidationError, TableRecord};
pub use repo::table_repo::{RepoError, RepoResult, SqliteTableAccessor, TableAccessor};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
