//! Error types for mapping and relation-resolution operations.
//!
//! Errors carry a programmatic [`ErrorCode`], a human-readable message, and
//! optional context (operation, model, field) with actionable suggestions.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: G{category}{number}
//! - 1xxx: Query errors (empty response, invalid filter)
//! - 2xxx: Relation errors (unknown relation, kind mismatch)
//! - 3xxx: Mutation errors (unconstrained destroy, missing identity)
//! - 4xxx: Transaction errors
//! - 5xxx: Execution and data errors
//! - 9xxx: Internal errors
//!
//! # Creating Errors
//!
//! ```rust
//! use gantry_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::empty_response("User");
//! assert_eq!(err.code, ErrorCode::EmptyResponse);
//!
//! let err = QueryError::unknown_relation("User", "posts");
//! assert_eq!(err.code, ErrorCode::UnknownRelation);
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for mapping operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// A required fetch returned no rows (G1001).
    EmptyResponse = 1001,
    /// Multiple rows found when expecting one (G1002).
    NotUnique = 1002,
    /// Invalid filter or where clause (G1003).
    InvalidFilter = 1003,

    // Relation errors (2xxx)
    /// Requested relation has no accessor on the model (G2001).
    UnknownRelation = 2001,
    /// Single-entity relation declared with a multi-entity target (G2002).
    RelationTypeMismatch = 2002,
    /// Relation access requires a bound key the owner does not have (G2003).
    UnboundRelation = 2003,

    // Mutation errors (3xxx)
    /// Delete attempted with no identity and no where-predicate (G3001).
    DestroyWithoutConstraint = 3001,
    /// Update attempted on an entity with no identity value (G3002).
    MissingIdentity = 3002,

    // Transaction errors (4xxx)
    /// Transaction failed (G4001).
    TransactionFailed = 4001,
    /// Transaction already committed or rolled back (G4002).
    TransactionClosed = 4002,

    // Execution and data errors (5xxx)
    /// The query-builder collaborator reported a failure (G5001).
    ExecutionFailed = 5001,
    /// Invalid parameter (G5002).
    InvalidParameter = 5002,
    /// Serialization error (G5003).
    SerializationError = 5003,

    // Internal errors (9xxx)
    /// Internal error (G9001).
    Internal = 9001,
    /// Unknown error (G9999).
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the error code string (e.g., "G2001").
    pub fn code(&self) -> String {
        format!("G{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "Required fetch returned no rows",
            Self::NotUnique => "Multiple rows found",
            Self::InvalidFilter => "Invalid filter condition",
            Self::UnknownRelation => "Unknown relation",
            Self::RelationTypeMismatch => "Relation target kind mismatch",
            Self::UnboundRelation => "Relation key not bound",
            Self::DestroyWithoutConstraint => "Destroy without constraint",
            Self::MissingIdentity => "Missing identity value",
            Self::TransactionFailed => "Transaction failed",
            Self::TransactionClosed => "Transaction already closed",
            Self::ExecutionFailed => "Query execution failed",
            Self::InvalidParameter => "Invalid parameter",
            Self::SerializationError => "Serialization error",
            Self::Internal => "Internal error",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field or relation involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Create new empty context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Errors that can occur during mapping operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field or relation.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an empty-response error for a required fetch.
    pub fn empty_response(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::EmptyResponse,
            format!("No {} rows found matching the query", model),
        )
        .with_model(&model)
        .with_suggestion("Drop the `require` option to get an empty result instead of an error")
    }

    /// Create an unknown-relation error.
    pub fn unknown_relation(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::UnknownRelation,
            format!("{} has no relation named '{}'", model, relation),
        )
        .with_model(&model)
        .with_field(&relation)
        .with_suggestion(format!(
            "Declare the relation on the {} model before loading it",
            model
        ))
    }

    /// Create an unknown-model error, reported as an unknown relation target.
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::UnknownRelation,
            format!("Model '{}' is not registered", model),
        )
        .with_model(&model)
        .with_suggestion("Register the target model before resolving relations against it")
    }

    /// Create a relation-kind mismatch error.
    pub fn relation_type_mismatch(relation: impl Into<String>) -> Self {
        let relation = relation.into();
        Self::new(
            ErrorCode::RelationTypeMismatch,
            format!(
                "Relation '{}' expects a single-entity target but was given a collection",
                relation
            ),
        )
        .with_field(&relation)
        .with_suggestion("Use has_many or belongs_to_many for collection targets")
    }

    /// Create an unbound-relation error.
    pub fn unbound_relation(relation: impl Into<String>, key: impl Into<String>) -> Self {
        let relation = relation.into();
        let key = key.into();
        Self::new(
            ErrorCode::UnboundRelation,
            format!(
                "Relation '{}' requires a value for '{}' on the owning entity",
                relation, key
            ),
        )
        .with_field(&relation)
        .with_suggestion("Save or fetch the owning entity before accessing the relation")
    }

    /// Create a destroy-guard error.
    pub fn destroy_without_constraint(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::DestroyWithoutConstraint,
            format!(
                "Refusing to delete {} rows with no identity and no where-predicate",
                model
            ),
        )
        .with_model(&model)
        .with_help("An unconstrained delete would remove every row in the table")
    }

    /// Create a missing-identity error.
    pub fn missing_identity(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::MissingIdentity,
            format!("{} entity has no identity value", model),
        )
        .with_model(&model)
        .with_suggestion("Insert the entity first, or set its identity attribute")
    }

    /// Create an invalid input error.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid input for {}: {}", field, message),
        )
        .with_field(&field)
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TransactionFailed,
            format!("Transaction error: {}", message.into()),
        )
    }

    /// Create an execution error from the query-builder collaborator.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, message.into())
            .with_suggestion("Check the backing store logs for more details")
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::EmptyResponse.code(), "G1001");
        assert_eq!(ErrorCode::UnknownRelation.code(), "G2001");
        assert_eq!(ErrorCode::RelationTypeMismatch.code(), "G2002");
        assert_eq!(ErrorCode::DestroyWithoutConstraint.code(), "G3001");
    }

    #[test]
    fn test_empty_response() {
        let err = QueryError::empty_response("User");
        assert_eq!(err.code, ErrorCode::EmptyResponse);
        assert!(err.to_string().contains("User"));
        assert!(err.to_string().contains("G1001"));
    }

    #[test]
    fn test_unknown_relation_context() {
        let err = QueryError::unknown_relation("User", "posts");
        assert_eq!(err.context.model.as_deref(), Some("User"));
        assert_eq!(err.context.field.as_deref(), Some("posts"));
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_builder_context() {
        let err = QueryError::destroy_without_constraint("User")
            .with_operation("destroy")
            .with_suggestion("Add a where-predicate");
        assert_eq!(err.context.operation.as_deref(), Some("destroy"));
        assert_eq!(err.context.suggestions.len(), 1);
        assert!(err.context.help.is_some());
    }
}
