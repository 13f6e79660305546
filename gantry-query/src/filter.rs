//! Filter predicates for constraining queries.
//!
//! Filters are the predicate vocabulary the engine applies to the
//! query-builder collaborator via `where_`/`where_in`. They are plain values:
//! the collaborator decides how to execute them, and in-memory engines can
//! evaluate them directly with [`Filter::matches`].
//!
//! ```rust
//! use gantry_query::{Filter, Value};
//!
//! let filter = Filter::Equals("email".into(), Value::String("test@example.com".into()));
//!
//! let combined = Filter::and([
//!     Filter::Equals("active".into(), Value::Bool(true)),
//!     Filter::In("role".into(), vec!["admin".into(), "moderator".into()]),
//! ]);
//! ```

use crate::value::{Row, Value};

/// A predicate that can be applied to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Equals comparison.
    Equals(String, Value),
    /// Not equals comparison.
    NotEquals(String, Value),
    /// In a list of values.
    In(String, Vec<Value>),
    /// Not in a list of values.
    NotIn(String, Vec<Value>),
    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),
    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
}

impl Filter {
    /// Combine filters with AND.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Combine filters with OR.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// The column this filter constrains, for simple (non-compound) filters.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Equals(c, _)
            | Self::NotEquals(c, _)
            | Self::In(c, _)
            | Self::NotIn(c, _)
            | Self::IsNull(c)
            | Self::IsNotNull(c) => Some(c),
            Self::And(_) | Self::Or(_) => None,
        }
    }

    /// Evaluate the filter against one row.
    ///
    /// A column absent from the row compares as null. Column names may be
    /// table-qualified (`"users.id"`); only the final segment is looked up.
    pub fn matches(&self, row: &Row) -> bool {
        fn lookup<'a>(row: &'a Row, column: &str) -> Value {
            let key = column.rsplit('.').next().unwrap_or(column);
            row.get(key).cloned().unwrap_or(Value::Null)
        }

        match self {
            Self::Equals(c, v) => lookup(row, c) == *v,
            Self::NotEquals(c, v) => lookup(row, c) != *v,
            Self::In(c, vs) => vs.contains(&lookup(row, c)),
            Self::NotIn(c, vs) => !vs.contains(&lookup(row, c)),
            Self::IsNull(c) => lookup(row, c).is_null(),
            Self::IsNotNull(c) => !lookup(row, c).is_null(),
            Self::And(fs) => fs.iter().all(|f| f.matches(row)),
            Self::Or(fs) => fs.iter().any(|f| f.matches(row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row;

    #[test]
    fn test_equals_matches() {
        let r = row([("id", 1.into()), ("name", "a".into())]);
        assert!(Filter::Equals("id".into(), 1.into()).matches(&r));
        assert!(!Filter::Equals("id".into(), 2.into()).matches(&r));
    }

    #[test]
    fn test_missing_column_is_null() {
        let r = row([("id", 1.into())]);
        assert!(Filter::IsNull("email".into()).matches(&r));
        assert!(!Filter::Equals("email".into(), "x".into()).matches(&r));
    }

    #[test]
    fn test_in_list() {
        let r = row([("role", "admin".into())]);
        let f = Filter::In("role".into(), vec!["admin".into(), "moderator".into()]);
        assert!(f.matches(&r));
        let f = Filter::In("role".into(), vec![]);
        assert!(!f.matches(&r));
    }

    #[test]
    fn test_qualified_column() {
        let r = row([("user_id", 3.into())]);
        assert!(Filter::Equals("user_roles.user_id".into(), 3.into()).matches(&r));
    }

    #[test]
    fn test_compound() {
        let r = row([("a", 1.into()), ("b", 2.into())]);
        let f = Filter::and([
            Filter::Equals("a".into(), 1.into()),
            Filter::Equals("b".into(), 2.into()),
        ]);
        assert!(f.matches(&r));
        let f = Filter::or([
            Filter::Equals("a".into(), 9.into()),
            Filter::Equals("b".into(), 2.into()),
        ]);
        assert!(f.matches(&r));
        assert!(f.column().is_none());
    }
}
