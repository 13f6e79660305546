//! Ordered, homogeneous collections of entities.
//!
//! An [`EntitySet`] holds entities of one declared model. Insertion enforces
//! the homogeneity invariant; an optional [`Comparator`] orders members.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::model::ModelDef;
use crate::registry::Database;
use crate::relations::{EagerLoader, PivotColumn, PivotOps, RelationDef, RelationKind};
use crate::types::{Comparator, Options, SortOrder};
use crate::value::{Row, Value};

/// Ordered sequence of entities sharing one declared model.
#[derive(Debug, Clone)]
pub struct EntitySet {
    model: Arc<ModelDef>,
    entities: Vec<Entity>,
    comparator: Option<Comparator>,
    relation: Option<RelationDef>,
}

impl EntitySet {
    /// Create an empty set of the given model.
    pub fn new(model: Arc<ModelDef>) -> Self {
        Self {
            model,
            entities: Vec::new(),
            comparator: None,
            relation: None,
        }
    }

    /// The set's declared model.
    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    /// Shared handle to the declared model.
    pub fn model_arc(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// Number of member entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Member at the given position.
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Iterate over members in order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Append an entity, enforcing the declared-model invariant.
    pub fn push(&mut self, entity: Entity) -> QueryResult<()> {
        if entity.model().name() != self.model.name() {
            return Err(QueryError::invalid_input(
                "entity",
                format!(
                    "cannot add a {} entity to a set of {}",
                    entity.model().name(),
                    self.model.name()
                ),
            ));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Consume the set, returning its members.
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.entities
    }

    /// Replace all members with one entity per fetched row.
    pub(crate) fn assign_rows(&mut self, rows: Vec<Row>) {
        self.entities = rows
            .into_iter()
            .map(|row| Entity::with_attributes(Arc::clone(&self.model), row))
            .collect();
    }

    /// Drop all members (empty fetch result).
    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }

    /// Set the ordering comparator.
    pub fn set_comparator(&mut self, comparator: Comparator) {
        self.comparator = Some(comparator);
    }

    /// Sort members by the comparator, if one is set.
    pub fn sort(&mut self) {
        if let Some(comparator) = &self.comparator {
            let column = comparator.column.clone();
            let order = comparator.order;
            self.entities.sort_by(|a, b| {
                let left = a.get(&column).cloned().unwrap_or(Value::Null);
                let right = b.get(&column).cloned().unwrap_or(Value::Null);
                let ordering = compare_values(&left, &right);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
    }

    /// The relation descriptor this instance carries, when it was built by a
    /// relation accessor.
    pub fn relation_def(&self) -> Option<&RelationDef> {
        self.relation.as_ref()
    }

    pub(crate) fn attach_relation(&mut self, def: RelationDef) {
        self.relation = Some(def);
    }

    /// Extend the carried relation's pivot-column list.
    ///
    /// Only meaningful on a BelongsToMany target instance, and only before
    /// the relation is fetched.
    pub fn with_pivot(
        &mut self,
        columns: impl IntoIterator<Item = PivotColumn>,
    ) -> QueryResult<&mut Self> {
        match &mut self.relation {
            Some(def) if def.kind == RelationKind::BelongsToMany => {
                def.extend_pivot(columns);
                Ok(self)
            }
            _ => Err(QueryError::invalid_input(
                "with_pivot",
                "pivot columns apply only to a many-to-many relation target",
            )),
        }
    }

    /// The pivot-operations capability, present on BelongsToMany target
    /// instances.
    pub fn pivot_ops(&self) -> QueryResult<PivotOps<'_>> {
        match &self.relation {
            Some(def) if def.kind == RelationKind::BelongsToMany => Ok(PivotOps::new(def)),
            _ => Err(QueryError::invalid_input(
                "pivot",
                "pivot operations apply only to a many-to-many relation target",
            )),
        }
    }

    /// Fetch all rows for this set, replacing its members.
    pub async fn fetch(&mut self, db: &Database, options: &Options) -> QueryResult<Vec<Row>> {
        Dispatcher::for_set(db, self, options)?.fetch_all().await
    }

    /// Eagerly resolve the given relation paths onto every member.
    pub async fn load(
        &mut self,
        db: &Database,
        paths: &[&str],
        options: &Options,
    ) -> QueryResult<()> {
        EagerLoader::new(db).load_set(self, paths, options).await
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
