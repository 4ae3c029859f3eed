//! Structured row predicates.
//!
//! # Responsibility
//! - Describe WHERE conditions as data (`field`, operator, value).
//! - Compile predicates into parameter-bound SQL fragments.
//!
//! # Invariants
//! - Compiled SQL contains only `Field::column()` names, operators, grouping
//!   parentheses and `?` placeholders.
//! - `params` order matches placeholder order in `sql`.

use crate::model::field::{Field, FieldValue};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Comparison operator for `Filter::Compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// SQL `LIKE`; text columns only.
    Like,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

/// Row predicate used by query, update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    /// Matches every row.
    #[default]
    All,
    Compare {
        field: Field,
        op: CompareOp,
        value: FieldValue,
    },
    In {
        field: Field,
        values: Vec<FieldValue>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

/// Reasons a filter cannot be turned into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// `And`/`Or` without operands.
    EmptyGroup,
    /// `In` without candidate values.
    EmptyInList(Field),
    /// Value type does not match the column storage type.
    TypeMismatch { field: Field, value: FieldValue },
    /// `Like` used on a non-text column.
    LikeOnNonText(Field),
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGroup => write!(f, "filter group must contain at least one condition"),
            Self::EmptyInList(field) => write!(f, "IN list for `{field}` cannot be empty"),
            Self::TypeMismatch { field, value } => {
                write!(f, "value {value:?} does not match column `{field}`")
            }
            Self::LikeOnNonText(field) => write!(f, "LIKE is not supported on column `{field}`"),
        }
    }
}

impl Error for FilterError {}

/// SQL fragment plus its bound values, ready to append after `WHERE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Filter {
    pub fn compare(field: Field, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Self::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn lt(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn like(field: Field, pattern: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Like, pattern.into())
    }

    pub fn is_in<V: Into<FieldValue>>(field: Field, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested `And` groups.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`, flattening nested `Or` groups.
    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns whether this filter trivially matches every row.
    ///
    /// Sees through `And` groups made only of such filters, `Or` groups
    /// containing one, and double negation. Column conditions that happen to
    /// match every row (`id >= 0`) are not detected.
    pub fn is_unconditional(&self) -> bool {
        match self {
            Self::All => true,
            Self::And(filters) => {
                !filters.is_empty() && filters.iter().all(Self::is_unconditional)
            }
            Self::Or(filters) => filters.iter().any(Self::is_unconditional),
            Self::Not(inner) => match inner.as_ref() {
                Self::Not(twice) => twice.is_unconditional(),
                _ => false,
            },
            Self::Compare { .. } | Self::In { .. } => false,
        }
    }

    /// Compiles this filter into a WHERE fragment with bound parameters.
    ///
    /// # Errors
    /// - Returns `FilterError` for empty groups, empty `In` lists, `Like` on
    ///   non-text columns and values of the wrong storage type.
    pub fn compile(&self) -> Result<CompiledFilter, FilterError> {
        let mut compiled = CompiledFilter {
            sql: String::new(),
            params: Vec::new(),
        };
        self.write_sql(&mut compiled)?;
        Ok(compiled)
    }

    fn write_sql(&self, out: &mut CompiledFilter) -> Result<(), FilterError> {
        match self {
            Self::All => out.sql.push_str("1 = 1"),
            Self::Compare { field, op, value } => {
                if *op == CompareOp::Like && !field.is_text() {
                    return Err(FilterError::LikeOnNonText(*field));
                }
                check_value(*field, value)?;
                out.sql.push_str(field.column());
                out.sql.push(' ');
                out.sql.push_str(op.sql());
                out.sql.push_str(" ?");
                out.params.push(value.to_sql_value());
            }
            Self::In { field, values } => {
                if values.is_empty() {
                    return Err(FilterError::EmptyInList(*field));
                }
                out.sql.push_str(field.column());
                out.sql.push_str(" IN (");
                for (index, value) in values.iter().enumerate() {
                    check_value(*field, value)?;
                    if index > 0 {
                        out.sql.push_str(", ");
                    }
                    out.sql.push('?');
                    out.params.push(value.to_sql_value());
                }
                out.sql.push(')');
            }
            Self::And(filters) => write_group(filters, " AND ", out)?,
            Self::Or(filters) => write_group(filters, " OR ", out)?,
            Self::Not(inner) => {
                out.sql.push_str("NOT (");
                inner.write_sql(out)?;
                out.sql.push(')');
            }
        }
        Ok(())
    }
}

fn write_group(
    filters: &[Filter],
    separator: &str,
    out: &mut CompiledFilter,
) -> Result<(), FilterError> {
    if filters.is_empty() {
        return Err(FilterError::EmptyGroup);
    }

    out.sql.push('(');
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            out.sql.push_str(separator);
        }
        filter.write_sql(out)?;
    }
    out.sql.push(')');
    Ok(())
}

fn check_value(field: Field, value: &FieldValue) -> Result<(), FilterError> {
    if field.accepts(value) {
        return Ok(());
    }
    Err(FilterError::TypeMismatch {
        field,
        value: value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::{Filter, FilterError};
    use crate::model::field::Field;
    use rusqlite::types::Value;

    #[test]
    fn all_compiles_to_tautology_without_params() {
        let compiled = Filter::All.compile().unwrap();
        assert_eq!(compiled.sql, "1 = 1");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn compare_binds_value_as_placeholder() {
        let compiled = Filter::eq(Field::Name, "Margot' OR 1=1 --")
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "name = ?");
        assert_eq!(
            compiled.params,
            vec![Value::Text("Margot' OR 1=1 --".to_string())]
        );
    }

    #[test]
    fn nested_groups_keep_placeholder_order() {
        let filter = Filter::gt(Field::Id, 3)
            .and(Filter::like(Field::Email, "%@xmpl.com"))
            .and(Filter::eq(Field::Name, "Tamir").or(Filter::is_in(Field::Id, [1, 2])).not());
        let compiled = filter.compile().unwrap();

        assert_eq!(
            compiled.sql,
            "(id > ? AND email LIKE ? AND NOT ((name = ? OR id IN (?, ?))))"
        );
        assert_eq!(
            compiled.params,
            vec![
                Value::Integer(3),
                Value::Text("%@xmpl.com".to_string()),
                Value::Text("Tamir".to_string()),
                Value::Integer(1),
                Value::Integer(2),
            ]
        );
    }

    #[test]
    fn is_unconditional_sees_through_trivial_wrappers() {
        assert!(Filter::All.is_unconditional());
        assert!(Filter::All.not().not().is_unconditional());
        assert!(Filter::And(vec![Filter::All]).is_unconditional());
        assert!(Filter::eq(Field::Name, "Tamir")
            .or(Filter::All)
            .is_unconditional());

        assert!(!Filter::All.not().is_unconditional());
        assert!(!Filter::And(Vec::new()).is_unconditional());
        assert!(!Filter::All
            .and(Filter::eq(Field::Name, "Tamir"))
            .is_unconditional());
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert_eq!(
            Filter::And(Vec::new()).compile().unwrap_err(),
            FilterError::EmptyGroup
        );
        assert_eq!(
            Filter::is_in(Field::Email, Vec::<String>::new())
                .compile()
                .unwrap_err(),
            FilterError::EmptyInList(Field::Email)
        );
        assert_eq!(
            Filter::like(Field::Id, "1%").compile().unwrap_err(),
            FilterError::LikeOnNonText(Field::Id)
        );
        assert!(matches!(
            Filter::eq(Field::Id, "1").compile().unwrap_err(),
            FilterError::TypeMismatch { field: Field::Id, .. }
        ));
    }
}
