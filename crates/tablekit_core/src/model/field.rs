//! Column identifiers and bindable values.
//!
//! # Invariants
//! - `Field` is the closed allow-list of columns; no other column name can be
//!   produced by this crate.
//! - Only `Name` and `Email` are mutable; `Id` is assigned once by the store.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One column of the fixed `(id, name, email)` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Name,
    Email,
}

impl Field {
    /// Column name as it appears in SQL.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
        }
    }

    /// Whether `update_records` may assign this column.
    pub fn is_mutable(self) -> bool {
        !matches!(self, Self::Id)
    }

    pub fn is_text(self) -> bool {
        matches!(self, Self::Name | Self::Email)
    }

    /// Whether `value` has the storage type of this column.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Integer(_) => !self.is_text(),
            FieldValue::Text(_) => self.is_text(),
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Value compared against or assigned to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub(crate) fn to_sql_value(&self) -> Value {
        match self {
            Self::Integer(value) => Value::Integer(*value),
            Self::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, FieldValue};

    #[test]
    fn only_name_and_email_are_mutable() {
        assert!(!Field::Id.is_mutable());
        assert!(Field::Name.is_mutable());
        assert!(Field::Email.is_mutable());
    }

    #[test]
    fn accepts_matches_column_storage_type() {
        assert!(Field::Id.accepts(&FieldValue::from(7)));
        assert!(!Field::Id.accepts(&FieldValue::from("7")));
        assert!(Field::Email.accepts(&FieldValue::from("a@b.c")));
        assert!(!Field::Name.accepts(&FieldValue::from(3_i64)));
    }
}
