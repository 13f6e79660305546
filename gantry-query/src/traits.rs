//! The external collaborator contracts.
//!
//! The core depends on two traits, not on any query language or backend:
//!
//! - [`QueryBuilder`] — a stateful, single-use query under construction.
//!   Constraints accumulate via `where_`/`where_in`/`join`, then exactly one
//!   terminal call (`select`/`insert`/`update`/`delete`) executes it. The
//!   engine discards the builder afterwards so constraints can never leak
//!   into an unrelated operation.
//! - [`Engine`] — manufactures one fresh builder per query and begins
//!   transactions.
//!
//! In-memory engines for tests implement both against a `Vec<Row>` store and
//! can evaluate [`Filter`](crate::filter::Filter)s directly.

use async_trait::async_trait;

use crate::error::QueryResult;
use crate::filter::Filter;
use crate::transaction::{TransactionConfig, TransactionToken};
use crate::value::{Row, Value};

/// One column of a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectColumn {
    /// Every column of the queried table (`table.*`).
    TableStar(String),
    /// A named column.
    Named(String),
    /// A column selected under an output alias (`source AS alias`).
    Aliased {
        /// Source column, possibly table-qualified.
        source: String,
        /// Output alias.
        alias: String,
    },
}

impl SelectColumn {
    /// Select every column of the given table.
    pub fn table_star(table: impl Into<String>) -> Self {
        Self::TableStar(table.into())
    }

    /// Select a named column.
    pub fn named(column: impl Into<String>) -> Self {
        Self::Named(column.into())
    }

    /// Select a column under an alias.
    pub fn aliased(source: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Aliased {
            source: source.into(),
            alias: alias.into(),
        }
    }
}

/// Response from an insert: the store communicates the generated identity
/// back, if it generated one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertResponse {
    /// Identity value generated by the store.
    pub generated_id: Option<Value>,
}

impl InsertResponse {
    /// A response carrying a generated identity.
    pub fn with_id(id: impl Into<Value>) -> Self {
        Self {
            generated_id: Some(id.into()),
        }
    }
}

/// A stateful, single-use query under construction against one table.
#[async_trait]
pub trait QueryBuilder: Send {
    /// Apply a where-predicate.
    fn where_(&mut self, filter: Filter);

    /// Apply a `column IN (values)` predicate.
    fn where_in(&mut self, column: &str, values: Vec<Value>);

    /// Join another table on `left op right`.
    fn join(&mut self, table: &str, left: &str, op: &str, right: &str);

    /// Run the query inside the given transaction.
    fn transacting(&mut self, token: TransactionToken);

    /// Limit the number of returned rows.
    fn limit(&mut self, n: u64);

    /// The where-predicates applied so far.
    ///
    /// Used by the delete guard to refuse unconstrained bulk deletes.
    fn constraints(&self) -> &[Filter];

    /// Execute as a row query.
    async fn select(&mut self, columns: &[SelectColumn]) -> QueryResult<Vec<Row>>;

    /// Execute as an insert of one row.
    async fn insert(&mut self, attrs: Row) -> QueryResult<InsertResponse>;

    /// Execute as an update of the constrained rows, returning the affected count.
    async fn update(&mut self, attrs: Row) -> QueryResult<u64>;

    /// Execute as a delete of the constrained rows, returning the affected count.
    async fn delete(&mut self) -> QueryResult<u64>;
}

/// Manufacturer of single-use query builders.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Create a fresh builder against the given table.
    fn builder(&self, table: &str) -> Box<dyn QueryBuilder>;

    /// Begin a transaction, returning the token to thread through operations.
    async fn begin(&self, config: &TransactionConfig) -> QueryResult<TransactionToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_column_constructors() {
        assert_eq!(
            SelectColumn::table_star("users"),
            SelectColumn::TableStar("users".into())
        );
        assert_eq!(
            SelectColumn::aliased("user_roles.role_id", "_pivot_role_id"),
            SelectColumn::Aliased {
                source: "user_roles.role_id".into(),
                alias: "_pivot_role_id".into(),
            }
        );
    }

    #[test]
    fn test_insert_response() {
        let resp = InsertResponse::with_id(7);
        assert_eq!(resp.generated_id, Some(Value::Int(7)));
        assert_eq!(InsertResponse::default().generated_id, None);
    }
}
