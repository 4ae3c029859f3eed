//! Column assignments for `update_records`.
//!
//! # Invariants
//! - Only mutable fields can be assigned.
//! - Each field is assigned at most once; later `set` calls overwrite.

use crate::model::field::{Field, FieldValue};
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ordered `field -> new value` mapping for an UPDATE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    values: BTreeMap<Field, FieldValue>,
}

/// Reasons an assignment set cannot be turned into a SET clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// No fields to assign.
    Empty,
    /// Field is assigned by the store and cannot change.
    ImmutableField(Field),
    /// Value type does not match the column storage type.
    TypeMismatch { field: Field, value: FieldValue },
    /// Blank text would break the NOT NULL/non-empty invariant.
    BlankValue(Field),
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "update requires at least one assignment"),
            Self::ImmutableField(field) => write!(f, "column `{field}` cannot be updated"),
            Self::TypeMismatch { field, value } => {
                write!(f, "value {value:?} does not match column `{field}`")
            }
            Self::BlankValue(field) => write!(f, "column `{field}` cannot be set to blank"),
        }
    }
}

impl Error for AssignmentError {}

/// SET clause body plus its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAssignments {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the value assigned to `field`.
    pub fn set(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Validates against the mutable-column allow-list and builds
    /// `col = ?, col = ?`.
    pub fn compile(&self) -> Result<CompiledAssignments, AssignmentError> {
        if self.values.is_empty() {
            return Err(AssignmentError::Empty);
        }

        let mut columns = Vec::with_capacity(self.values.len());
        let mut params = Vec::with_capacity(self.values.len());
        for (field, value) in &self.values {
            if !field.is_mutable() {
                return Err(AssignmentError::ImmutableField(*field));
            }
            if !field.accepts(value) {
                return Err(AssignmentError::TypeMismatch {
                    field: *field,
                    value: value.clone(),
                });
            }
            if let FieldValue::Text(text) = value {
                if text.trim().is_empty() {
                    return Err(AssignmentError::BlankValue(*field));
                }
            }
            columns.push(format!("{} = ?", field.column()));
            params.push(value.to_sql_value());
        }

        Ok(CompiledAssignments {
            sql: columns.join(", "),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentError, Assignments};
    use crate::model::field::{Field, FieldValue};
    use rusqlite::types::Value;

    #[test]
    fn compile_orders_columns_by_field() {
        let compiled = Assignments::new()
            .set(Field::Email, "tamir@xmpl.com")
            .set(Field::Name, "Tamir")
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "name = ?, email = ?");
        assert_eq!(
            compiled.params,
            vec![
                Value::Text("Tamir".to_string()),
                Value::Text("tamir@xmpl.com".to_string()),
            ]
        );
    }

    #[test]
    fn set_overwrites_previous_value() {
        let assignments = Assignments::new()
            .set(Field::Name, "first")
            .set(Field::Name, "second");
        assert_eq!(assignments.len(), 1);
        assert_eq!(
            assignments.get(Field::Name),
            Some(&FieldValue::from("second"))
        );
    }

    #[test]
    fn compile_rejects_invalid_assignments() {
        assert_eq!(
            Assignments::new().compile().unwrap_err(),
            AssignmentError::Empty
        );
        assert_eq!(
            Assignments::new().set(Field::Id, 9).compile().unwrap_err(),
            AssignmentError::ImmutableField(Field::Id)
        );
        assert!(matches!(
            Assignments::new().set(Field::Name, 9).compile().unwrap_err(),
            AssignmentError::TypeMismatch { field: Field::Name, .. }
        ));
        assert_eq!(
            Assignments::new().set(Field::Email, "  ").compile().unwrap_err(),
            AssignmentError::BlankValue(Field::Email)
        );
    }
}
