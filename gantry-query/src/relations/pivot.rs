//! Pivot operations for many-to-many relations.
//!
//! A [`PivotOps`] capability is exposed by BelongsToMany relation target
//! instances. It attaches and detaches join-table rows for the owning
//! entity; one insert or delete is issued per item, and the items are
//! independent, so they run concurrently.

use futures::future::try_join_all;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::registry::Database;
use crate::relations::spec::RelationDef;
use crate::traits::InsertResponse;
use crate::types::Options;
use crate::value::{Row, Value};

/// One item to attach or detach.
#[derive(Debug, Clone)]
pub enum AttachItem {
    /// A bare identifier of the target entity.
    Id(Value),
    /// An attribute hash merged into the join row.
    Attributes(Row),
    /// An already-constructed target entity; its identity is used.
    Entity(Entity),
}

impl From<i64> for AttachItem {
    fn from(id: i64) -> Self {
        Self::Id(Value::Int(id))
    }
}

impl From<&str> for AttachItem {
    fn from(id: &str) -> Self {
        Self::Id(Value::String(id.to_string()))
    }
}

impl From<Value> for AttachItem {
    fn from(id: Value) -> Self {
        Self::Id(id)
    }
}

impl From<Row> for AttachItem {
    fn from(attrs: Row) -> Self {
        Self::Attributes(attrs)
    }
}

impl From<Entity> for AttachItem {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

/// Join-table operations for one BelongsToMany relation target.
#[derive(Debug)]
pub struct PivotOps<'a> {
    def: &'a RelationDef,
}

impl<'a> PivotOps<'a> {
    pub(crate) fn new(def: &'a RelationDef) -> Self {
        Self { def }
    }

    fn join_table(&self) -> &str {
        self.def.join_table.as_deref().unwrap_or_default()
    }

    fn owner_key(&self) -> &str {
        self.def.other_key.as_deref().unwrap_or_default()
    }

    fn owner_value(&self) -> QueryResult<Value> {
        self.def
            .fk_value
            .clone()
            .ok_or_else(|| QueryError::unbound_relation(&self.def.name, self.owner_key()))
    }

    /// Build one join row for an item: the owner's bound key is always set;
    /// the target's key comes from the item's identifier or entity identity,
    /// or is left to an attribute hash merged in.
    fn join_row(&self, item: AttachItem, owner_value: &Value) -> QueryResult<Row> {
        let mut row = Row::new();
        row.insert(self.owner_key().to_string(), owner_value.clone());
        match item {
            AttachItem::Id(id) => {
                row.insert(self.def.foreign_key.clone(), id);
            }
            AttachItem::Entity(entity) => {
                let id = entity.id().cloned().ok_or_else(|| {
                    QueryError::invalid_input("ids", "attached entity has no identity value")
                })?;
                row.insert(self.def.foreign_key.clone(), id);
            }
            AttachItem::Attributes(attrs) => {
                row.extend(attrs);
            }
        }
        Ok(row)
    }

    /// Insert one join row per item.
    ///
    /// An empty item list is a no-op that resolves immediately without
    /// issuing any query.
    pub async fn attach(
        &self,
        db: &Database,
        items: Vec<AttachItem>,
        options: &Options,
    ) -> QueryResult<Vec<InsertResponse>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let owner_value = self.owner_value()?;
        let rows = items
            .into_iter()
            .map(|item| self.join_row(item, &owner_value))
            .collect::<QueryResult<Vec<_>>>()?;
        debug!(
            relation = %self.def.name,
            table = %self.join_table(),
            count = rows.len(),
            "attaching join rows"
        );
        try_join_all(rows.into_iter().map(|row| {
            let mut builder = db.engine().builder(self.join_table());
            if let Some(token) = options.transaction {
                builder.transacting(token);
            }
            async move { builder.insert(row).await }
        }))
        .await
    }

    /// Delete join rows, one delete per item matched by the same row shape
    /// as [`attach`](Self::attach).
    ///
    /// With `None`, detaches by the base relation constraint alone: every
    /// join row for the owner is removed.
    pub async fn detach(
        &self,
        db: &Database,
        items: Option<Vec<AttachItem>>,
        options: &Options,
    ) -> QueryResult<u64> {
        let owner_value = self.owner_value()?;
        let rows = match items {
            None => {
                let mut row = Row::new();
                row.insert(self.owner_key().to_string(), owner_value);
                vec![row]
            }
            Some(items) => items
                .into_iter()
                .map(|item| self.join_row(item, &owner_value))
                .collect::<QueryResult<Vec<_>>>()?,
        };
        debug!(
            relation = %self.def.name,
            table = %self.join_table(),
            count = rows.len(),
            "detaching join rows"
        );
        let counts = try_join_all(rows.into_iter().map(|row| {
            let mut builder = db.engine().builder(self.join_table());
            if let Some(token) = options.transaction {
                builder.transacting(token);
            }
            for (column, value) in row {
                builder.where_(Filter::Equals(column, value));
            }
            async move { builder.delete().await }
        }))
        .await?;
        Ok(counts.into_iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelDef, ModelRegistry, RelationDecl};
    use crate::value::row;

    fn bound_def() -> RelationDef {
        let mut models = ModelRegistry::new();
        models.register(
            ModelDef::new("User", "users").relation(
                "roles",
                RelationDecl::belongs_to_many("Role").join_table("user_roles"),
            ),
        );
        models.register(ModelDef::new("Role", "roles"));
        let user = models.require("User").unwrap();
        let owner = Entity::with_attributes(std::sync::Arc::clone(&user), row([("id", 1.into())]));
        RelationDef::instantiate(&user, "roles", &models, Some(&owner)).unwrap()
    }

    #[test]
    fn test_join_row_from_id() {
        let def = bound_def();
        let ops = PivotOps::new(&def);
        let joined = ops.join_row(AttachItem::from(5i64), &Value::Int(1)).unwrap();
        assert_eq!(joined.get("user_id"), Some(&Value::Int(1)));
        assert_eq!(joined.get("role_id"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_join_row_from_attributes() {
        let def = bound_def();
        let ops = PivotOps::new(&def);
        let attrs = row([("role_id", 7.into()), ("granted_at", "2026-01-01".into())]);
        let joined = ops
            .join_row(AttachItem::from(attrs), &Value::Int(1))
            .unwrap();
        assert_eq!(joined.get("user_id"), Some(&Value::Int(1)));
        assert_eq!(joined.get("role_id"), Some(&Value::Int(7)));
        assert_eq!(
            joined.get("granted_at"),
            Some(&Value::String("2026-01-01".into()))
        );
    }

    #[test]
    fn test_join_row_from_entity_requires_identity() {
        let def = bound_def();
        let ops = PivotOps::new(&def);
        let role = Entity::new(std::sync::Arc::new(ModelDef::new("Role", "roles")));
        let err = ops
            .join_row(AttachItem::from(role), &Value::Int(1))
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidParameter);
    }
}
