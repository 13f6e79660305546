//! The query dispatcher.
//!
//! A [`Dispatcher`] adapts one Entity or EntitySet operation (fetch-one,
//! fetch-many, insert, update, delete) into calls against the query-builder
//! collaborator. It is single-use: construction creates a fresh builder,
//! every method consumes the dispatcher, and the builder is discarded once
//! its one query has executed, so constraints never leak across operations.
//!
//! Construction applies, in order: the transaction token from the options
//! bag, then — when the target carries a constrained-mode relation
//! descriptor — the relation's join and bound key constraint.

use tracing::debug;

use crate::collection::EntitySet;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::events::{EventKind, EventPayload, EventResponse, EventTarget};
use crate::filter::Filter;
use crate::registry::Database;
use crate::relations::{EagerLoader, RelationDef};
use crate::traits::{InsertResponse, QueryBuilder, SelectColumn};
use crate::types::Options;
use crate::value::{Row, Value};

pub(crate) enum Target<'a> {
    Entity(&'a mut Entity),
    Set(&'a mut EntitySet),
}

impl Target<'_> {
    fn model_name(&self) -> &str {
        match self {
            Target::Entity(entity) => entity.model().name(),
            Target::Set(set) => set.model().name(),
        }
    }
}

/// Single-use adapter from one Entity/EntitySet operation to the
/// query-builder collaborator.
pub struct Dispatcher<'a> {
    db: &'a Database,
    target: Target<'a>,
    options: &'a Options,
    builder: Box<dyn QueryBuilder>,
    columns: Vec<SelectColumn>,
}

impl<'a> Dispatcher<'a> {
    /// Build a dispatcher for a single entity.
    pub fn for_entity(
        db: &'a Database,
        entity: &'a mut Entity,
        options: &'a Options,
    ) -> QueryResult<Self> {
        let relation = entity.relation_def().cloned();
        let table = entity.model().table().to_string();
        Self::build(db, Target::Entity(entity), options, &table, relation.as_ref())
    }

    /// Build a dispatcher for an entity set.
    pub fn for_set(
        db: &'a Database,
        set: &'a mut EntitySet,
        options: &'a Options,
    ) -> QueryResult<Self> {
        let relation = set.relation_def().cloned();
        let table = set.model().table().to_string();
        Self::build(db, Target::Set(set), options, &table, relation.as_ref())
    }

    /// Build a dispatcher for one batched relation fetch, constrained by the
    /// given parent keys.
    pub(crate) fn for_relation(
        db: &'a Database,
        set: &'a mut EntitySet,
        def: &RelationDef,
        keys: Vec<Value>,
        options: &'a Options,
    ) -> QueryResult<Self> {
        let table = set.model().table().to_string();
        let mut dispatcher = Self::build(db, Target::Set(set), options, &table, None)?;
        apply_relation(dispatcher.builder.as_mut(), def, keys);
        dispatcher.columns = def.select_columns();
        Ok(dispatcher)
    }

    fn build(
        db: &'a Database,
        target: Target<'a>,
        options: &'a Options,
        table: &str,
        relation: Option<&RelationDef>,
    ) -> QueryResult<Self> {
        let mut builder = db.engine().builder(table);
        if let Some(token) = options.transaction {
            builder.transacting(token);
        }
        let mut columns = vec![SelectColumn::table_star(table)];
        if let Some(def) = relation {
            let value = def.fk_value.clone().ok_or_else(|| {
                QueryError::unbound_relation(&def.name, def.constraint_column())
            })?;
            apply_relation(builder.as_mut(), def, vec![value]);
            columns = def.select_columns();
        }
        Ok(Self {
            db,
            target,
            options,
            builder,
            columns,
        })
    }

    /// Fetch one row, constrained by the entity's currently-set attributes.
    pub async fn fetch_first(mut self) -> QueryResult<Vec<Row>> {
        let Target::Entity(entity) = &self.target else {
            return Err(QueryError::invalid_input(
                "target",
                "fetch_first operates on a single entity",
            ));
        };
        for (column, value) in entity.attributes() {
            self.builder
                .where_(Filter::Equals(column.clone(), value.clone()));
        }
        self.builder.limit(1);
        self.fetch_all().await
    }

    /// Execute the row query and populate the target.
    ///
    /// The resolved value is the raw row response, also when `with_related`
    /// hands off to the eager loader.
    pub async fn fetch_all(mut self) -> QueryResult<Vec<Row>> {
        debug!(
            model = %self.target.model_name(),
            constraints = self.builder.constraints().len(),
            "dispatching fetch"
        );
        let rows: Vec<Row> = self
            .builder
            .select(&self.columns)
            .await?
            .into_iter()
            .map(sanitize_row)
            .collect();

        if rows.is_empty() {
            if self.options.require {
                return Err(QueryError::empty_response(self.target.model_name()));
            }
            match &mut self.target {
                Target::Entity(entity) => entity.clear_attributes(),
                Target::Set(set) => set.clear(),
            }
            return Ok(rows);
        }

        match &mut self.target {
            Target::Entity(entity) => entity.assign_row(rows[0].clone()),
            Target::Set(set) => set.assign_rows(rows.clone()),
        }

        if !self.options.with_related.is_empty() {
            let paths: Vec<&str> = self.options.with_related.iter().map(String::as_str).collect();
            let loader = EagerLoader::new(self.db);
            match &mut self.target {
                Target::Entity(entity) => loader.load_entity(entity, &paths, self.options).await?,
                Target::Set(set) => loader.load_set(set, &paths, self.options).await?,
            }
        }

        let target = match &self.target {
            Target::Entity(entity) => EventTarget::Entity(entity),
            Target::Set(set) => EventTarget::Set(set),
        };
        self.db.events().notify(EventPayload {
            kind: EventKind::Fetched,
            target,
            response: EventResponse::Rows(&rows),
            options: self.options,
        });
        Ok(rows)
    }

    /// Send the entity's attribute map as a new row.
    ///
    /// The store communicates the generated identity back in its response;
    /// it is assigned onto the entity.
    pub async fn insert(mut self) -> QueryResult<InsertResponse> {
        let Target::Entity(entity) = &mut self.target else {
            return Err(QueryError::invalid_input(
                "target",
                "insert operates on a single entity",
            ));
        };
        debug!(model = %entity.model().name(), "dispatching insert");
        let response = self.builder.insert(entity.attributes().clone()).await?;
        if let Some(id) = &response.generated_id {
            let key = entity.model().identity().to_string();
            entity.set(key, id.clone());
        }
        Ok(response)
    }

    /// Update the entity's row, constrained by identity equality.
    ///
    /// With `options.partial` and explicit `attrs`, only those attributes
    /// are sent; otherwise explicit attributes are merged in and the full
    /// map is sent.
    pub async fn update(mut self, attrs: Option<Row>) -> QueryResult<u64> {
        let Target::Entity(entity) = &mut self.target else {
            return Err(QueryError::invalid_input(
                "target",
                "update operates on a single entity",
            ));
        };
        let id = entity
            .id()
            .cloned()
            .ok_or_else(|| QueryError::missing_identity(entity.model().name()))?;
        let payload = match attrs {
            Some(attrs) if self.options.partial => attrs,
            Some(attrs) => {
                for (key, value) in attrs {
                    entity.set(key, value);
                }
                entity.attributes().clone()
            }
            None => entity.attributes().clone(),
        };
        debug!(model = %entity.model().name(), partial = self.options.partial, "dispatching update");
        self.builder
            .where_(Filter::Equals(entity.model().identity().to_string(), id));
        self.builder.update(payload).await
    }

    /// Delete the constrained rows.
    ///
    /// Constrained by identity equality when the entity has an identity
    /// value; otherwise by whatever predicates are already applied. Refuses
    /// to run with neither, guarding against unconstrained bulk deletes.
    pub async fn delete(mut self) -> QueryResult<u64> {
        if let Target::Entity(entity) = &self.target {
            if let Some(id) = entity.id() {
                self.builder.where_(Filter::Equals(
                    entity.model().identity().to_string(),
                    id.clone(),
                ));
            }
        }
        if self.builder.constraints().is_empty() {
            return Err(QueryError::destroy_without_constraint(
                self.target.model_name(),
            ));
        }
        debug!(model = %self.target.model_name(), "dispatching delete");
        self.builder.delete().await
    }
}

fn apply_relation(builder: &mut dyn QueryBuilder, def: &RelationDef, mut keys: Vec<Value>) {
    if let Some((table, left, op, right)) = def.join_clause() {
        builder.join(&table, &left, &op, &right);
    }
    let column = def.constraint_column();
    if keys.len() == 1 {
        builder.where_(Filter::Equals(column, keys.remove(0)));
    } else {
        builder.where_in(&column, keys);
    }
}

/// Defensive row sanitization: drop columns without a usable name.
fn sanitize_row(row: Row) -> Row {
    row.into_iter().filter(|(k, _)| !k.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row;

    #[test]
    fn test_sanitize_row_drops_blank_keys() {
        let mut r = row([("id", 1.into())]);
        r.insert(String::new(), Value::Int(9));
        r.insert("  ".to_string(), Value::Int(9));
        let clean = sanitize_row(r);
        assert_eq!(clean.len(), 1);
        assert!(clean.contains_key("id"));
    }
}
