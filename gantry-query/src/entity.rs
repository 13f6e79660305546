//! The attribute container backing one row.
//!
//! An [`Entity`] holds a row's schema-less attributes and a map of resolved
//! related entities or entity sets. It has no relation logic of its own: the
//! relation map is populated by the eager loader, and relation accessors
//! only build descriptors for the resolver and dispatcher to act on.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gantry_query::{Entity, ModelDef};
//!
//! let user = Arc::new(ModelDef::new("User", "users"));
//! let mut entity = Entity::new(Arc::clone(&user));
//! assert!(entity.is_new());
//!
//! entity.set("id", 1);
//! entity.set("email", "test@example.com");
//! assert!(!entity.is_new());
//! assert_eq!(entity.get("email").and_then(|v| v.as_str()), Some("test@example.com"));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::collection::EntitySet;
use crate::dispatcher::Dispatcher;
use crate::error::QueryResult;
use crate::events::{EventKind, EventPayload, EventResponse, EventTarget};
use crate::model::{ModelDef, ModelRegistry};
use crate::registry::Database;
use crate::relations::{EagerLoader, RelationDef};
use crate::types::Options;
use crate::value::{Row, Value};

/// A resolved relation target: one entity or an entity set.
#[derive(Debug, Clone)]
pub enum Related {
    /// Single related entity (HasOne, BelongsTo).
    One(Entity),
    /// Related entity set (HasMany, BelongsToMany).
    Many(EntitySet),
}

impl Related {
    /// The single entity, if this is a `One`.
    pub fn as_one(&self) -> Option<&Entity> {
        match self {
            Self::One(entity) => Some(entity),
            Self::Many(_) => None,
        }
    }

    /// The entity set, if this is a `Many`.
    pub fn as_many(&self) -> Option<&EntitySet> {
        match self {
            Self::One(_) => None,
            Self::Many(set) => Some(set),
        }
    }
}

/// In-memory representation of one row.
#[derive(Debug, Clone)]
pub struct Entity {
    model: Arc<ModelDef>,
    attributes: Row,
    relations: IndexMap<String, Related>,
    cid: Uuid,
    relation: Option<RelationDef>,
}

impl Entity {
    /// Create an empty, unpersisted entity of the given model.
    pub fn new(model: Arc<ModelDef>) -> Self {
        Self {
            model,
            attributes: Row::new(),
            relations: IndexMap::new(),
            cid: Uuid::new_v4(),
            relation: None,
        }
    }

    /// Create an entity seeded with attributes.
    pub fn with_attributes(model: Arc<ModelDef>, attributes: Row) -> Self {
        let mut entity = Self::new(model);
        entity.attributes = attributes;
        entity
    }

    /// The entity's model definition.
    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    /// Shared handle to the model definition.
    pub fn model_arc(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// Transient client-correlation id, for entities not yet persisted.
    pub fn cid(&self) -> Uuid {
        self.cid
    }

    /// Get an attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set an attribute value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Check whether an attribute is present.
    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Remove an attribute, returning its previous value.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    /// The full attribute map, in insertion order.
    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    /// The identity value, when set and non-null.
    pub fn id(&self) -> Option<&Value> {
        self.get(self.model.identity()).filter(|v| !v.is_null())
    }

    /// Whether the entity has not been persisted: derived from the absence
    /// of an identity value.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Replace all attributes with one fetched row.
    pub(crate) fn assign_row(&mut self, row: Row) {
        self.attributes = row;
    }

    /// Drop all attributes (empty fetch result).
    pub(crate) fn clear_attributes(&mut self) {
        self.attributes.clear();
    }

    /// Resolved relations, keyed by accessor name.
    pub fn relations(&self) -> &IndexMap<String, Related> {
        &self.relations
    }

    /// A resolved relation, if the eager loader populated it.
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub(crate) fn set_related(&mut self, name: impl Into<String>, related: Related) {
        self.relations.insert(name.into(), related);
    }

    /// The relation descriptor this instance carries, when it was built by a
    /// relation accessor.
    pub fn relation_def(&self) -> Option<&RelationDef> {
        self.relation.as_ref()
    }

    pub(crate) fn attach_relation(&mut self, def: RelationDef) {
        self.relation = Some(def);
    }

    /// Invoke a relation accessor in constrained mode.
    ///
    /// Builds the relation descriptor bound to this entity's current key
    /// value and returns a live target instance carrying it, ready for an
    /// immediate constrained fetch (or, for BelongsToMany, pivot
    /// operations).
    pub fn relation(&self, models: &ModelRegistry, name: &str) -> QueryResult<Related> {
        let def = RelationDef::instantiate(&self.model, name, models, Some(self))?;
        let target = models.require(&def.target_model)?;
        Ok(if def.kind.is_single() {
            let mut entity = Entity::new(target);
            entity.attach_relation(def);
            Related::One(entity)
        } else {
            let mut set = EntitySet::new(target);
            set.attach_relation(def);
            Related::Many(set)
        })
    }

    /// Validation hook invoked before save. Deliberately a no-op: validation
    /// is deferred to the caller.
    pub fn validate(&self) -> QueryResult<()> {
        Ok(())
    }

    /// Fetch this entity's row, constrained by its currently-set attributes.
    pub async fn fetch(&mut self, db: &Database, options: &Options) -> QueryResult<Vec<Row>> {
        Dispatcher::for_entity(db, self, options)?.fetch_first().await
    }

    /// Eagerly resolve the given relation paths onto this entity.
    pub async fn load(
        &mut self,
        db: &Database,
        paths: &[&str],
        options: &Options,
    ) -> QueryResult<()> {
        EagerLoader::new(db).load_entity(self, paths, options).await
    }

    /// Persist the entity: insert when new, update otherwise.
    pub async fn save(&mut self, db: &Database, options: &Options) -> QueryResult<()> {
        self.validate()?;
        db.events().notify(EventPayload {
            kind: EventKind::BeforeSave,
            target: EventTarget::Entity(self),
            response: EventResponse::None,
            options,
        });
        if self.is_new() {
            let response = Dispatcher::for_entity(db, self, options)?.insert().await?;
            db.events().notify(EventPayload {
                kind: EventKind::Created,
                target: EventTarget::Entity(self),
                response: EventResponse::Insert(&response),
                options,
            });
        } else {
            let affected = Dispatcher::for_entity(db, self, options)?
                .update(None)
                .await?;
            db.events().notify(EventPayload {
                kind: EventKind::Updated,
                target: EventTarget::Entity(self),
                response: EventResponse::Affected(affected),
                options,
            });
        }
        Ok(())
    }

    /// Update the entity with explicit attributes.
    ///
    /// With `options.partial`, only the provided attributes are sent;
    /// otherwise they are merged into the entity and the full map is sent.
    pub async fn update(
        &mut self,
        db: &Database,
        attrs: Row,
        options: &Options,
    ) -> QueryResult<u64> {
        self.validate()?;
        db.events().notify(EventPayload {
            kind: EventKind::BeforeSave,
            target: EventTarget::Entity(self),
            response: EventResponse::None,
            options,
        });
        let affected = Dispatcher::for_entity(db, self, options)?
            .update(Some(attrs))
            .await?;
        db.events().notify(EventPayload {
            kind: EventKind::Updated,
            target: EventTarget::Entity(self),
            response: EventResponse::Affected(affected),
            options,
        });
        Ok(affected)
    }

    /// Delete the entity's row, guarded against unconstrained deletes.
    pub async fn destroy(&mut self, db: &Database, options: &Options) -> QueryResult<u64> {
        db.events().notify(EventPayload {
            kind: EventKind::BeforeDestroy,
            target: EventTarget::Entity(self),
            response: EventResponse::None,
            options,
        });
        let affected = Dispatcher::for_entity(db, self, options)?.delete().await?;
        db.events().notify(EventPayload {
            kind: EventKind::Destroyed,
            target: EventTarget::Entity(self),
            response: EventResponse::Affected(affected),
            options,
        });
        Ok(affected)
    }
}
