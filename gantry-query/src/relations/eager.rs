//! Batched eager resolution of relation paths.
//!
//! The [`EagerLoader`] turns dotted relation paths (`"posts.comments"`) into
//! one batched query per distinct relation name per nesting level, then
//! matches the fetched children back onto their parents by key. For a parent
//! set of any size, each relation costs exactly one query per level.
//!
//! Resolution of one level:
//!
//! 1. Split every path on `.`; the first segment names the relation at this
//!    level, the remainder joins that name's suffix list. Suffixes are
//!    recorded unconditionally, so duplicate top-level names each contribute
//!    their own deeper paths; only the first occurrence constructs the
//!    relation descriptor.
//! 2. One batched fetch per distinct name, dispatched concurrently. Each
//!    fetch recurses into its own suffix list as soon as its own rows are
//!    known.
//! 3. A barrier joins all same-level fetches (all-succeed, fail-fast), then
//!    children are matched onto every parent in registration order, so the
//!    resulting graph is deterministic regardless of query completion order.
//!
//! Nested levels are strictly sequenced after their parent level: the
//! batched constraint for a child level requires the parent identities,
//! which exist only once the parent rows do.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use indexmap::IndexMap;
use tracing::debug;

use crate::collection::EntitySet;
use crate::dispatcher::Dispatcher;
use crate::entity::{Entity, Related};
use crate::error::{QueryError, QueryResult};
use crate::model::ModelDef;
use crate::registry::Database;
use crate::relations::spec::{RelationDef, RelationKind};
use crate::types::Options;
use crate::value::Value;

/// Orchestrator of eager relation resolution.
pub struct EagerLoader<'a> {
    db: &'a Database,
}

impl<'a> EagerLoader<'a> {
    /// Create a loader against one database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve relation paths onto a single parent entity.
    pub async fn load_entity(
        &self,
        parent: &mut Entity,
        paths: &[&str],
        options: &Options,
    ) -> QueryResult<()> {
        let model = Arc::clone(parent.model_arc());
        let options = relation_options(options);
        self.process_related(model, std::slice::from_mut(parent), normalize(paths), &options)
            .await
    }

    /// Resolve relation paths onto every member of a parent set.
    pub async fn load_set(
        &self,
        parents: &mut EntitySet,
        paths: &[&str],
        options: &Options,
    ) -> QueryResult<()> {
        let model = Arc::clone(parents.model_arc());
        let options = relation_options(options);
        self.process_related(model, parents.entities_mut(), normalize(paths), &options)
            .await
    }

    /// Resolve one nesting level, recursing into path suffixes.
    fn process_related<'b>(
        &'b self,
        model: Arc<ModelDef>,
        parents: &'b mut [Entity],
        paths: Vec<String>,
        options: &'b Options,
    ) -> BoxFuture<'b, QueryResult<()>> {
        Box::pin(async move {
            let mut suffixes: IndexMap<String, Vec<String>> = IndexMap::new();
            let mut defs: IndexMap<String, RelationDef> = IndexMap::new();
            for path in &paths {
                let (name, rest) = match path.split_once('.') {
                    Some((name, rest)) => (name, Some(rest)),
                    None => (path.as_str(), None),
                };
                let entry = suffixes.entry(name.to_string()).or_default();
                if let Some(rest) = rest {
                    entry.push(rest.to_string());
                }
                if !defs.contains_key(name) {
                    let def = RelationDef::instantiate(&model, name, self.db.models(), None)?;
                    defs.insert(name.to_string(), def);
                }
            }
            if defs.is_empty() {
                return Ok(());
            }

            debug!(
                model = %model.name(),
                relations = defs.len(),
                parents = parents.len(),
                "resolving relation level"
            );

            let mut jobs = Vec::with_capacity(defs.len());
            for (name, def) in defs {
                let keys = gather_keys(&def, parents);
                let nested = suffixes.shift_remove(&name).unwrap_or_default();
                jobs.push((def, keys, nested));
            }

            let resolved = try_join_all(jobs.into_iter().map(|(def, keys, nested)| {
                async move {
                    let child_model = self.db.models().require(&def.target_model)?;
                    let mut children = EntitySet::new(Arc::clone(&child_model));
                    Dispatcher::for_relation(self.db, &mut children, &def, keys, options)?
                        .fetch_all()
                        .await?;
                    if !nested.is_empty() {
                        self.process_related(child_model, children.entities_mut(), nested, options)
                            .await?;
                    }
                    Ok::<_, QueryError>((def, children))
                }
            }))
            .await?;

            for (def, children) in &resolved {
                match_level(def, parents, children)?;
            }
            Ok(())
        })
    }
}

fn normalize(paths: &[&str]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Options for the relation fetches themselves: `require` and `with_related`
/// belong to the outer operation, while the transaction token threads
/// through unchanged.
fn relation_options(options: &Options) -> Options {
    let mut options = options.without_related();
    options.require = false;
    options
}

/// Distinct, non-null parent key values, in parent order.
fn gather_keys(def: &RelationDef, parents: &[Entity]) -> Vec<Value> {
    let column = def.parent_id_attribute.as_deref().unwrap_or_default();
    let mut keys = Vec::new();
    for parent in parents {
        if let Some(value) = parent.get(column) {
            if !value.is_null() && !keys.contains(value) {
                keys.push(value.clone());
            }
        }
    }
    keys
}

/// Match one relation's fetched children onto every parent at this level.
fn match_level(def: &RelationDef, parents: &mut [Entity], children: &EntitySet) -> QueryResult<()> {
    let parent_key_column = def.parent_id_attribute.as_deref().unwrap_or_default();
    let child_key_column = def.child_key_column();
    let child_model = children.model_arc();

    for parent in parents.iter_mut() {
        let key = parent
            .get(parent_key_column)
            .filter(|v| !v.is_null())
            .cloned();
        let matches: Vec<Entity> = match &key {
            Some(key) => children
                .iter()
                .filter(|child| child.get(&child_key_column) == Some(key))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let related = match def.kind {
            RelationKind::HasOne | RelationKind::BelongsTo => Related::One(
                matches
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| Entity::new(Arc::clone(child_model))),
            ),
            RelationKind::HasMany | RelationKind::BelongsToMany => {
                let mut set = EntitySet::new(Arc::clone(child_model));
                for child in matches {
                    set.push(child)?;
                }
                Related::Many(set)
            }
        };
        parent.set_related(def.name.clone(), related);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelDef, ModelRegistry, RelationDecl};
    use crate::value::row;

    fn post_children(models: &ModelRegistry) -> (RelationDef, EntitySet) {
        let user = models.require("User").unwrap();
        let def = RelationDef::instantiate(&user, "posts", models, None).unwrap();
        let mut children = EntitySet::new(models.require("Post").unwrap());
        children.assign_rows(vec![
            row([("id", 10.into()), ("user_id", 1.into())]),
            row([("id", 11.into()), ("user_id", 1.into())]),
            row([("id", 12.into()), ("user_id", 2.into())]),
        ]);
        (def, children)
    }

    fn registry() -> ModelRegistry {
        let mut models = ModelRegistry::new();
        models.register(
            ModelDef::new("User", "users").relation("posts", RelationDecl::has_many("Post")),
        );
        models.register(ModelDef::new("Post", "posts"));
        models
    }

    #[test]
    fn test_gather_keys_distinct_non_null() {
        let models = registry();
        let user = models.require("User").unwrap();
        let def = RelationDef::instantiate(&user, "posts", &models, None).unwrap();
        let parents: Vec<Entity> = vec![
            Entity::with_attributes(user.clone(), row([("id", 1.into())])),
            Entity::with_attributes(user.clone(), row([("id", 1.into())])),
            Entity::with_attributes(user.clone(), row([("id", Value::Null)])),
            Entity::with_attributes(user.clone(), row([("id", 2.into())])),
        ];
        assert_eq!(gather_keys(&def, &parents), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_match_level_is_injective() {
        let models = registry();
        let user = models.require("User").unwrap();
        let (def, children) = post_children(&models);
        let mut parents = vec![
            Entity::with_attributes(user.clone(), row([("id", 1.into())])),
            Entity::with_attributes(user.clone(), row([("id", 2.into())])),
            Entity::with_attributes(user.clone(), row([("id", 3.into())])),
        ];
        match_level(&def, &mut parents, &children).unwrap();

        let posts_of = |parent: &Entity| -> Vec<i64> {
            parent
                .related("posts")
                .unwrap()
                .as_many()
                .unwrap()
                .iter()
                .map(|e| e.id().unwrap().as_int().unwrap())
                .collect()
        };
        assert_eq!(posts_of(&parents[0]), vec![10, 11]);
        assert_eq!(posts_of(&parents[1]), vec![12]);
        assert!(posts_of(&parents[2]).is_empty());
    }

    #[test]
    fn test_match_level_single_fallback_is_fresh_entity() {
        let mut models = ModelRegistry::new();
        models.register(
            ModelDef::new("User", "users").relation("account", RelationDecl::has_one("Account")),
        );
        models.register(ModelDef::new("Account", "accounts"));
        let user = models.require("User").unwrap();
        let def = RelationDef::instantiate(&user, "account", &models, None).unwrap();
        let children = EntitySet::new(models.require("Account").unwrap());
        let mut parents = vec![Entity::with_attributes(user, row([("id", 1.into())]))];
        match_level(&def, &mut parents, &children).unwrap();

        let related = parents[0].related("account").unwrap().as_one().unwrap();
        assert!(related.is_new());
        assert!(related.attributes().is_empty());
    }

    #[test]
    fn test_normalize_drops_blank_paths() {
        assert_eq!(normalize(&["a.b", " ", "c"]), vec!["a.b", "c"]);
    }
}
