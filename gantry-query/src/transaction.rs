//! Transaction tokens and configuration.
//!
//! Connection and transaction management belong to the external engine; the
//! core only threads an opaque [`TransactionToken`] unchanged through every
//! query of an operation. [`TransactionConfig`] is the vocabulary a caller
//! passes to [`Engine::begin`](crate::traits::Engine::begin).
//!
//! ```rust
//! use gantry_query::{IsolationLevel, TransactionConfig};
//!
//! let config = TransactionConfig::new().isolation(IsolationLevel::Serializable);
//! assert_eq!(config.isolation.as_sql(), "SERIALIZABLE");
//! ```

use uuid::Uuid;

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    /// Read uncommitted - allows dirty reads.
    ReadUncommitted,
    /// Read committed - prevents dirty reads.
    #[default]
    ReadCommitted,
    /// Repeatable read - prevents non-repeatable reads.
    RepeatableRead,
    /// Serializable - highest isolation level.
    Serializable,
}

impl IsolationLevel {
    /// Get the SQL clause for this isolation level.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Configuration for beginning a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionConfig {
    /// Isolation level.
    pub isolation: IsolationLevel,
    /// Read-only access.
    pub read_only: bool,
}

impl TransactionConfig {
    /// Create a new transaction config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = level;
        self
    }

    /// Make the transaction read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// An opaque handle identifying one open transaction.
///
/// Shared read-only context: the core never mutates it, only copies it into
/// the query builders of nested fetches and pivot operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionToken(Uuid);

impl TransactionToken {
    /// Mint a fresh token.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The token's unique id.
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_config_builder() {
        let config = TransactionConfig::new()
            .isolation(IsolationLevel::RepeatableRead)
            .read_only();
        assert_eq!(config.isolation, IsolationLevel::RepeatableRead);
        assert!(config.read_only);
    }

    #[test]
    fn test_tokens_are_distinct() {
        assert_ne!(TransactionToken::new(), TransactionToken::new());
    }
}
