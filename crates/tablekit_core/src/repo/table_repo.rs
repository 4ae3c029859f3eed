//! Table accessor contract and SQLite implementation.
//!
//! # Responsibility
//! - Bind a `TableRecord` type to one named table in one store file.
//! - Provide insert-or-replace, update, query and delete over that table.
//!
//! # Invariants
//! - Every operation opens its own connection and drops it before returning.
//! - Write paths validate records/assignments before SQL mutations.
//! - Filters and assignments reach SQL only as compiled, parameter-bound
//!   fragments.

use crate::db::schema::{ensure_table, TableName, TableNameError};
use crate::db::{open_db, DbError};
use crate::model::assignments::{AssignmentError, Assignments};
use crate::model::field::Field;
use crate::model::filter::{Filter, FilterError};
use crate::model::record::{RecordId, RecordValidationError, TableRecord};
use log::{error, info, warn};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for table access operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    /// A write violated a table constraint (unique email, NOT NULL).
    SchemaViolation(String),
    InvalidFilter(FilterError),
    InvalidAssignment(AssignmentError),
    InvalidTableName(TableNameError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::SchemaViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidFilter(err) => write!(f, "invalid filter: {err}"),
            Self::InvalidAssignment(err) => write!(f, "invalid update: {err}"),
            Self::InvalidTableName(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidFilter(err) => Some(err),
            Self::InvalidAssignment(err) => Some(err),
            Self::InvalidTableName(err) => Some(err),
            Self::SchemaViolation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl RepoError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Db(DbError::Open { .. }) => "store_unavailable",
            Self::Db(_) => "db",
            Self::SchemaViolation(_) => "schema_violation",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::InvalidAssignment(_) => "invalid_assignment",
            Self::InvalidTableName(_) => "invalid_table_name",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::SchemaViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<FilterError> for RepoError {
    fn from(value: FilterError) -> Self {
        Self::InvalidFilter(value)
    }
}

impl From<AssignmentError> for RepoError {
    fn from(value: AssignmentError) -> Self {
        Self::InvalidAssignment(value)
    }
}

impl From<TableNameError> for RepoError {
    fn from(value: TableNameError) -> Self {
        Self::InvalidTableName(value)
    }
}

/// CRUD contract over one table of `R` rows.
pub trait TableAccessor<R: TableRecord> {
    /// Inserts every record in one transaction; a duplicate email replaces
    /// the existing row. Returns the number of records written.
    fn add_records(&self, records: &[R]) -> RepoResult<usize>;
    /// Applies `assignments` to rows matching `filter`. Returns affected rows.
    fn update_records(&self, filter: &Filter, assignments: &Assignments) -> RepoResult<usize>;
    /// Returns matching rows ordered by `id`.
    fn get_records(&self, filter: &Filter) -> RepoResult<Vec<R>>;
    fn get_record(&self, id: RecordId) -> RepoResult<Option<R>>;
    fn count_records(&self, filter: &Filter) -> RepoResult<u64>;
    /// Removes rows matching `filter`. Returns removed rows.
    fn delete_records(&self, filter: &Filter) -> RepoResult<usize>;
}

/// SQLite-backed accessor for one table in one store file.
#[derive(Debug, Clone)]
pub struct SqliteTableAccessor<R> {
    db_path: PathBuf,
    table: TableName,
    _record: PhantomData<fn() -> R>,
}

impl<R: TableRecord> SqliteTableAccessor<R> {
    /// Binds `R` to `table_name` in the store at `db_path`, creating the
    /// table if absent.
    ///
    /// # Errors
    /// - `RepoError::InvalidTableName` when `table_name` is not a plain
    ///   identifier.
    /// - `RepoError::Db(DbError::Open { .. })` when the store is unavailable.
    pub fn open(db_path: impl AsRef<Path>, table_name: &str) -> RepoResult<Self> {
        let table = TableName::parse(table_name)?;
        let accessor = Self {
            db_path: db_path.as_ref().to_path_buf(),
            table,
            _record: PhantomData,
        };

        let started_at = Instant::now();
        let result = accessor
            .connect()
            .and_then(|conn| ensure_table(&conn, &accessor.table).map_err(RepoError::from));
        log_outcome("table_ensure", &accessor.table, started_at, result.as_ref().map(|_| 0));
        result?;

        Ok(accessor)
    }

    pub fn table_name(&self) -> &TableName {
        &self.table
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> RepoResult<Connection> {
        Ok(open_db(&self.db_path)?)
    }

    fn insert_batch(&self, records: &[R]) -> RepoResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for record in records {
            record.validate()?;
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {} (name, email) VALUES (?1, ?2);",
                self.table.quoted()
            ))?;
            for record in records {
                stmt.execute(params![record.name(), record.email()])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn update_matching(&self, filter: &Filter, assignments: &Assignments) -> RepoResult<usize> {
        let set_clause = assignments.compile()?;
        let where_clause = filter.compile()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {};",
            self.table.quoted(),
            set_clause.sql,
            where_clause.sql
        );

        let mut bind_values = set_clause.params;
        bind_values.extend(where_clause.params);

        let conn = self.connect()?;
        let changed = conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn select_matching(&self, filter: &Filter) -> RepoResult<Vec<R>> {
        let where_clause = filter.compile()?;
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, email FROM {} WHERE {} ORDER BY id ASC;",
            self.table.quoted(),
            where_clause.sql
        ))?;

        let mut rows = stmt.query(params_from_iter(where_clause.params))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn count_matching(&self, filter: &Filter) -> RepoResult<u64> {
        let where_clause = filter.compile()?;
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {};",
                self.table.quoted(),
                where_clause.sql
            ),
            params_from_iter(where_clause.params),
            |row| row.get(0),
        )?;

        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete_matching(&self, filter: &Filter) -> RepoResult<usize> {
        let where_clause = filter.compile()?;
        if filter.is_unconditional() {
            warn!(
                "event=table_delete module=repo status=unconditional table={}",
                self.table
            );
        }

        let conn = self.connect()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {};",
                self.table.quoted(),
                where_clause.sql
            ),
            params_from_iter(where_clause.params),
        )?;
        Ok(removed)
    }
}

impl<R: TableRecord> TableAccessor<R> for SqliteTableAccessor<R> {
    fn add_records(&self, records: &[R]) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.insert_batch(records);
        log_outcome("table_insert", &self.table, started_at, result.as_ref().copied());
        result
    }

    fn update_records(&self, filter: &Filter, assignments: &Assignments) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.update_matching(filter, assignments);
        log_outcome("table_update", &self.table, started_at, result.as_ref().copied());
        result
    }

    fn get_records(&self, filter: &Filter) -> RepoResult<Vec<R>> {
        let started_at = Instant::now();
        let result = self.select_matching(filter);
        log_outcome("table_query", &self.table, started_at, result.as_ref().map(Vec::len));
        result
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<R>> {
        let records = self.get_records(&Filter::eq(Field::Id, id))?;
        Ok(records.into_iter().next())
    }

    fn count_records(&self, filter: &Filter) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.count_matching(filter);
        log_outcome(
            "table_count",
            &self.table,
            started_at,
            result.as_ref().map(|count| usize::try_from(*count).unwrap_or(usize::MAX)),
        );
        result
    }

    fn delete_records(&self, filter: &Filter) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.delete_matching(filter);
        log_outcome("table_delete", &self.table, started_at, result.as_ref().copied());
        result
    }
}

fn parse_record_row<R: TableRecord>(row: &Row<'_>) -> RepoResult<R> {
    let id: RecordId = row.get("id")?;
    Ok(R::from_columns(id, row.get("name")?, row.get("email")?))
}

// Only row counts and error codes are logged; record contents never are.
fn log_outcome(
    event: &str,
    table: &TableName,
    started_at: Instant,
    outcome: Result<usize, &RepoError>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(rows) => info!(
            "event={event} module=repo status=ok table={table} rows={rows} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=repo status=error table={table} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
