//! # gantry-query
//!
//! The relational mapping and eager-loading engine of the Gantry data layer.
//!
//! Given entities backed by rows and declarative relation definitions
//! (one-to-one, one-to-many, many-to-one, many-to-many through a join
//! table), the engine translates requests for related data into a minimal
//! set of batched queries, applies the join and filter semantics of each
//! relation kind, and reassembles the results into an entity graph matching
//! every parent to its children by key — one query per relation per nesting
//! level, regardless of parent-set size.
//!
//! The SQL layer itself is an external collaborator: the engine depends only
//! on the [`Engine`]/[`QueryBuilder`] contract, not on any query language or
//! backend.
//!
//! ## Declaring models
//!
//! ```rust
//! use gantry_query::{ModelDef, ModelRegistry, RelationDecl};
//!
//! let mut models = ModelRegistry::new();
//! models.register(
//!     ModelDef::new("User", "users")
//!         .relation("posts", RelationDecl::has_many("Post"))
//!         .relation("roles", RelationDecl::belongs_to_many("Role").join_table("user_roles")),
//! );
//! models.register(
//!     ModelDef::new("Post", "posts")
//!         .relation("author", RelationDecl::belongs_to("User")),
//! );
//! models.register(ModelDef::new("Role", "roles"));
//! ```
//!
//! ## Eager loading
//!
//! ```rust,ignore
//! let mut users = EntitySet::new(models.require("User")?);
//! users.fetch(&db, &Options::new()).await?;
//!
//! // One batched query per relation per level: users' posts, then the
//! // posts' comments, constrained by the fetched post identities.
//! users.load(&db, &["posts.comments"], &Options::new()).await?;
//!
//! let first = users.get(0).unwrap();
//! let posts = first.related("posts").unwrap().as_many().unwrap();
//! ```
//!
//! ## Values and filters
//!
//! ```rust
//! use gantry_query::{Filter, Value};
//!
//! let v: Value = 42.into();
//! assert!(matches!(v, Value::Int(42)));
//!
//! let filter = Filter::In("id".into(), vec![1.into(), 2.into()]);
//! assert_eq!(filter.column(), Some("id"));
//! ```

pub mod collection;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod events;
pub mod filter;
pub mod logging;
pub mod model;
pub mod registry;
pub mod relations;
pub mod traits;
pub mod transaction;
pub mod types;
pub mod value;

pub use collection::EntitySet;
pub use dispatcher::Dispatcher;
pub use entity::{Entity, Related};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use events::{EventKind, EventPayload, EventResponse, EventSink, EventTarget, NullSink};
pub use filter::Filter;
pub use model::{ModelDef, ModelRegistry, RelationDecl, RelationTarget};
pub use registry::{Database, DatabaseRegistry};
pub use relations::{
    AttachItem, EagerLoader, PivotColumn, PivotOps, RelationDef, RelationKind, PIVOT_PREFIX,
};
pub use traits::{Engine, InsertResponse, QueryBuilder, SelectColumn};
pub use transaction::{IsolationLevel, TransactionConfig, TransactionToken};
pub use types::{Comparator, Options, SortOrder};
pub use value::{row, Row, Value};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::collection::EntitySet;
    pub use crate::entity::{Entity, Related};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::Filter;
    pub use crate::model::{ModelDef, ModelRegistry, RelationDecl};
    pub use crate::registry::{Database, DatabaseRegistry};
    pub use crate::relations::{AttachItem, EagerLoader, PivotColumn, RelationKind};
    pub use crate::traits::{Engine, QueryBuilder};
    pub use crate::transaction::TransactionToken;
    pub use crate::types::Options;
    pub use crate::value::{Row, Value};
}
