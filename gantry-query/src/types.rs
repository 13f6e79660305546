//! Common option and ordering types.

use crate::transaction::TransactionToken;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering applied to an entity set: a sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    /// Column to sort by.
    pub column: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl Comparator {
    /// Create an ascending comparator.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    /// Create a descending comparator.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

/// The options bag threaded through fetch, save, destroy, and pivot
/// operations.
///
/// One bag serves every operation; fields that do not apply to an operation
/// are ignored by it.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Fail with `EmptyResponse` when a fetch returns no rows.
    pub require: bool,
    /// Relation paths to eagerly resolve after a fetch (e.g. `"posts.comments"`).
    pub with_related: Vec<String>,
    /// Transaction token threaded unchanged into every query of the operation.
    pub transaction: Option<TransactionToken>,
    /// On update, send only the explicitly provided attributes.
    pub partial: bool,
}

impl Options {
    /// Create an empty options bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-empty fetch result.
    pub fn require(mut self) -> Self {
        self.require = true;
        self
    }

    /// Eagerly resolve the given relation paths after fetching.
    pub fn with_related(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.with_related = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Thread a transaction token through the operation.
    pub fn transacting(mut self, token: TransactionToken) -> Self {
        self.transaction = Some(token);
        self
    }

    /// Send only explicitly provided attributes on update.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    /// A copy of these options with eager resolution cleared.
    ///
    /// Relation fetches dispatched by the resolver drive their own recursion
    /// from path suffixes, so the `with_related` handoff must not re-trigger.
    pub(crate) fn without_related(&self) -> Self {
        Self {
            with_related: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_options_builder() {
        let opts = Options::new()
            .require()
            .with_related(["posts.comments", "profile"])
            .partial();
        assert!(opts.require);
        assert!(opts.partial);
        assert_eq!(opts.with_related.len(), 2);
        assert!(opts.transaction.is_none());
    }

    #[test]
    fn test_without_related_keeps_rest() {
        let token = TransactionToken::new();
        let opts = Options::new().require().transacting(token).with_related(["a"]);
        let stripped = opts.without_related();
        assert!(stripped.with_related.is_empty());
        assert!(stripped.require);
        assert_eq!(stripped.transaction, Some(token));
    }
}
