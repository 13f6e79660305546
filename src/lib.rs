//! # Gantry
//!
//! A relational mapping and eager-loading data layer for Rust.
//!
//! Gantry provides:
//! - Schema-less entities and ordered entity sets backed by rows
//! - Declarative relations: has-one, has-many, belongs-to, and
//!   belongs-to-many through a join table
//! - Batched eager loading of dotted relation paths with one query per
//!   relation per nesting level — no N+1 explosions
//! - An async-first core built on Tokio that depends only on a small
//!   query-builder contract, not on any SQL dialect or backend
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gantry::prelude::*;
//!
//! let mut models = ModelRegistry::new();
//! models.register(
//!     ModelDef::new("User", "users")
//!         .relation("posts", RelationDecl::has_many("Post")),
//! );
//! models.register(
//!     ModelDef::new("Post", "posts")
//!         .relation("author", RelationDecl::belongs_to("User")),
//! );
//!
//! let db = Database::new(engine, models);
//!
//! let mut users = EntitySet::new(db.models().require("User")?);
//! users.fetch(&db, &Options::new()).await?;
//! users.load(&db, &["posts"], &Options::new()).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The mapping and relation-resolution engine.
pub mod query {
    pub use gantry_query::*;
}

// Re-export key types at the crate root
pub use gantry_query::{
    Database, DatabaseRegistry, Entity, EntitySet, ModelDef, ModelRegistry, Options, QueryError,
    QueryResult, Related, RelationDecl,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use gantry_query::prelude::*;
}
