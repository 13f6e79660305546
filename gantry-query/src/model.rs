//! Declarative model definitions and the model registry.
//!
//! A [`ModelDef`] names an entity type: its table, its identity attribute,
//! and its declared relations. Models reference each other by name through a
//! [`ModelRegistry`], so mutually-related models never form reference
//! cycles.
//!
//! ## Example
//!
//! ```rust
//! use gantry_query::{ModelDef, ModelRegistry, RelationDecl};
//!
//! let mut models = ModelRegistry::new();
//! models.register(
//!     ModelDef::new("User", "users")
//!         .relation("posts", RelationDecl::has_many("Post"))
//!         .relation("account", RelationDecl::has_one("Account")),
//! );
//! models.register(
//!     ModelDef::new("Post", "posts")
//!         .relation("author", RelationDecl::belongs_to("User")),
//! );
//!
//! let user = models.require("User").unwrap();
//! assert_eq!(user.table(), "users");
//! assert_eq!(user.id_attribute(), "id");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{QueryError, QueryResult};
use crate::relations::RelationKind;

/// The target of a relation declaration: a single-entity model or a
/// collection of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    /// A single-entity model, by name.
    Model(String),
    /// A collection of the named model.
    Collection(String),
}

impl RelationTarget {
    /// The target model's name.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Model(name) | Self::Collection(name) => name,
        }
    }

    /// Whether this target denotes a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }
}

impl From<&str> for RelationTarget {
    fn from(name: &str) -> Self {
        Self::Model(name.to_string())
    }
}

impl From<String> for RelationTarget {
    fn from(name: String) -> Self {
        Self::Model(name)
    }
}

/// A collection target, for declarations that relate to many of a model.
pub fn collection(model: impl Into<String>) -> RelationTarget {
    RelationTarget::Collection(model.into())
}

/// One declared relation on a model.
///
/// Key and join-table names left unset default at access time from the
/// participating table names (see `relations::spec`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDecl {
    /// Relation kind.
    pub kind: RelationKind,
    /// The related model or collection.
    pub target: RelationTarget,
    /// Foreign key column override.
    pub foreign_key: Option<String>,
    /// Other key column override.
    pub other_key: Option<String>,
    /// Join table override (BelongsToMany only).
    pub join_table: Option<String>,
}

impl RelationDecl {
    fn new(kind: RelationKind, target: impl Into<RelationTarget>) -> Self {
        Self {
            kind,
            target: target.into(),
            foreign_key: None,
            other_key: None,
            join_table: None,
        }
    }

    /// Declare a one-to-one relation.
    pub fn has_one(target: impl Into<RelationTarget>) -> Self {
        Self::new(RelationKind::HasOne, target)
    }

    /// Declare a one-to-many relation.
    pub fn has_many(target: impl Into<RelationTarget>) -> Self {
        Self::new(RelationKind::HasMany, target)
    }

    /// Declare a many-to-one relation.
    pub fn belongs_to(target: impl Into<RelationTarget>) -> Self {
        Self::new(RelationKind::BelongsTo, target)
    }

    /// Declare a many-to-many relation through a join table.
    pub fn belongs_to_many(target: impl Into<RelationTarget>) -> Self {
        Self::new(RelationKind::BelongsToMany, target)
    }

    /// Override the foreign key column.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Override the other key column.
    pub fn other_key(mut self, column: impl Into<String>) -> Self {
        self.other_key = Some(column.into());
        self
    }

    /// Override the join table name (BelongsToMany only).
    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }
}

/// Definition of one entity type.
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: String,
    table: String,
    id_attribute: String,
    relations: IndexMap<String, RelationDecl>,
}

impl ModelDef {
    /// Create a model definition with the default `"id"` identity attribute.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_attribute: "id".to_string(),
            relations: IndexMap::new(),
        }
    }

    /// Set the identity attribute name.
    pub fn id_attribute(mut self, key: impl Into<String>) -> Self {
        self.id_attribute = key.into();
        self
    }

    /// Declare a relation under the given accessor name.
    pub fn relation(mut self, name: impl Into<String>, decl: RelationDecl) -> Self {
        self.relations.insert(name.into(), decl);
        self
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The identity attribute name.
    pub fn identity(&self) -> &str {
        &self.id_attribute
    }

    /// Look up a declared relation.
    pub fn relation_decl(&self, name: &str) -> Option<&RelationDecl> {
        self.relations.get(name)
    }

    /// Declared relation accessor names, in declaration order.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

/// Registry mapping model names to their definitions.
///
/// Owned by the application entry point and passed explicitly; there is no
/// process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Arc<ModelDef>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, returning its shared definition.
    pub fn register(&mut self, def: ModelDef) -> Arc<ModelDef> {
        let def = Arc::new(def);
        self.models.insert(def.name().to_string(), Arc::clone(&def));
        def
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<Arc<ModelDef>> {
        self.models.get(name).cloned()
    }

    /// Look up a model by name, failing if it is not registered.
    pub fn require(&self, name: &str) -> QueryResult<Arc<ModelDef>> {
        self.get(name)
            .ok_or_else(|| QueryError::unknown_model(name))
    }

    /// Registered model names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_model_def_defaults() {
        let def = ModelDef::new("User", "users");
        assert_eq!(def.name(), "User");
        assert_eq!(def.table(), "users");
        assert_eq!(def.identity(), "id");
    }

    #[test]
    fn test_custom_identity() {
        let def = ModelDef::new("Account", "accounts").id_attribute("account_id");
        assert_eq!(def.identity(), "account_id");
    }

    #[test]
    fn test_relation_declaration_order() {
        let def = ModelDef::new("User", "users")
            .relation("posts", RelationDecl::has_many("Post"))
            .relation("account", RelationDecl::has_one("Account"));
        let names: Vec<_> = def.relation_names().collect();
        assert_eq!(names, vec!["posts", "account"]);
        assert_eq!(
            def.relation_decl("posts").unwrap().kind,
            RelationKind::HasMany
        );
    }

    #[test]
    fn test_decl_overrides() {
        let decl = RelationDecl::belongs_to_many("Role")
            .join_table("user_roles")
            .foreign_key("role_id")
            .other_key("user_id");
        assert_eq!(decl.join_table.as_deref(), Some("user_roles"));
        assert_eq!(decl.foreign_key.as_deref(), Some("role_id"));
        assert_eq!(decl.other_key.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_collection_target() {
        let target = collection("Post");
        assert!(target.is_collection());
        assert_eq!(target.model_name(), "Post");
        let plain: RelationTarget = "Post".into();
        assert!(!plain.is_collection());
    }

    #[test]
    fn test_registry_require() {
        let mut models = ModelRegistry::new();
        models.register(ModelDef::new("User", "users"));
        assert!(models.require("User").is_ok());
        let err = models.require("Ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownRelation);
    }
}
