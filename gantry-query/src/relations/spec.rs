//! Relation descriptors.
//!
//! A [`RelationDef`] is the declarative value object built when a relation
//! accessor is invoked: kind, resolved key columns, join table, pivot
//! columns, and either a bound constraint value (constrained mode) or the
//! parent key attribute (eager mode). Descriptors are created per access and
//! discarded once the fetch resolves.
//!
//! Key-column defaults derive from the participating table names:
//! the foreign key defaults to the singularized owner table plus `_id`, and a
//! many-to-many join table defaults to both table names, singularized,
//! sorted, and joined by `_`.

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::model::{ModelDef, ModelRegistry, RelationDecl};
use crate::traits::SelectColumn;
use crate::value::Value;

/// Prefix under which join-table columns are aliased into child rows.
pub const PIVOT_PREFIX: &str = "_pivot_";

/// Kind of relation between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one (e.g., User has one Account).
    HasOne,
    /// One-to-many (e.g., User has many Posts).
    HasMany,
    /// Many-to-one (e.g., Post belongs to User).
    BelongsTo,
    /// Many-to-many through a join table (e.g., User has many Roles).
    BelongsToMany,
}

impl RelationKind {
    /// Check if this relation targets a single entity.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::HasOne | Self::BelongsTo)
    }

    /// Check if this relation targets an entity set.
    pub fn is_many(&self) -> bool {
        !self.is_single()
    }
}

/// One extra join-table column selected alongside a many-to-many fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotColumn {
    /// Source column in the join table.
    pub column: String,
    /// Output alias in the child row.
    pub alias: String,
}

impl PivotColumn {
    /// A bare column, aliased under the pivot prefix.
    pub fn named(column: impl Into<String>) -> Self {
        let column = column.into();
        let alias = format!("{}{}", PIVOT_PREFIX, column);
        Self { column, alias }
    }

    /// A column with an explicit output alias.
    pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: alias.into(),
        }
    }
}

/// Reduce a table name to its singular form for key-column defaults.
pub(crate) fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn default_key(table: &str) -> String {
    format!("{}_id", singularize(table))
}

fn default_join_table(owner_table: &str, target_table: &str) -> String {
    let mut names = [singularize(owner_table), singularize(target_table)];
    names.sort();
    names.join("_")
}

/// A fully-resolved relation descriptor.
///
/// Column semantics per kind:
/// - HasOne/HasMany: `foreign_key` is the column on the target table
///   referencing the owner's identity.
/// - BelongsTo: `foreign_key` is the column on the owner referencing the
///   target's identity; `other_key` is the target's identity column.
/// - BelongsToMany: `foreign_key` is the join-table column referencing the
///   target, `other_key` the join-table column referencing the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Relation kind.
    pub kind: RelationKind,
    /// The accessor name the relation was registered under.
    pub name: String,
    /// Target model name.
    pub target_model: String,
    /// Target table name.
    pub target_table: String,
    /// Target identity column.
    pub target_identity: String,
    /// Foreign key column (see struct docs for per-kind semantics).
    pub foreign_key: String,
    /// Other key column, where the kind uses one.
    pub other_key: Option<String>,
    /// Join table (BelongsToMany only).
    pub join_table: Option<String>,
    /// Extra join-table columns to select (BelongsToMany only).
    pub pivot_columns: Vec<PivotColumn>,
    /// Bound constraint value (constrained mode only).
    pub fk_value: Option<Value>,
    /// Attribute gathered from parents for batching (eager mode only).
    pub parent_id_attribute: Option<String>,
}

impl RelationDef {
    /// Build the descriptor for `owner`'s relation `name`.
    ///
    /// `bound` selects the construction mode: `Some(entity)` binds the
    /// constraint value from that entity (constrained mode); `None` captures
    /// the parent key attribute for batched resolution (eager mode).
    pub(crate) fn instantiate(
        owner: &ModelDef,
        name: &str,
        models: &ModelRegistry,
        bound: Option<&Entity>,
    ) -> QueryResult<Self> {
        let decl = owner
            .relation_decl(name)
            .ok_or_else(|| QueryError::unknown_relation(owner.name(), name))?;
        if decl.kind.is_single() && decl.target.is_collection() {
            return Err(QueryError::relation_type_mismatch(name).with_model(owner.name()));
        }
        let target = models.require(decl.target.model_name())?;

        let mut def = Self::resolve(owner, name, decl, &target);
        match bound {
            Some(entity) => def.bind(entity)?,
            None => def.parent_id_attribute = Some(def.parent_key_column(owner).to_string()),
        }
        Ok(def)
    }

    fn resolve(owner: &ModelDef, name: &str, decl: &RelationDecl, target: &ModelDef) -> Self {
        let (foreign_key, other_key, join_table) = match decl.kind {
            RelationKind::HasOne | RelationKind::HasMany => (
                decl.foreign_key
                    .clone()
                    .unwrap_or_else(|| default_key(owner.table())),
                None,
                None,
            ),
            RelationKind::BelongsTo => (
                decl.foreign_key
                    .clone()
                    .or_else(|| decl.other_key.clone())
                    .unwrap_or_else(|| default_key(target.table())),
                Some(target.identity().to_string()),
                None,
            ),
            RelationKind::BelongsToMany => (
                decl.foreign_key
                    .clone()
                    .unwrap_or_else(|| default_key(target.table())),
                Some(
                    decl.other_key
                        .clone()
                        .unwrap_or_else(|| default_key(owner.table())),
                ),
                Some(
                    decl.join_table
                        .clone()
                        .unwrap_or_else(|| default_join_table(owner.table(), target.table())),
                ),
            ),
        };
        Self {
            kind: decl.kind,
            name: name.to_string(),
            target_model: target.name().to_string(),
            target_table: target.table().to_string(),
            target_identity: target.identity().to_string(),
            foreign_key,
            other_key,
            join_table,
            pivot_columns: Vec::new(),
            fk_value: None,
            parent_id_attribute: None,
        }
    }

    fn bind(&mut self, entity: &Entity) -> QueryResult<()> {
        let key = self.parent_key_column(entity.model());
        let value = entity
            .get(key)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| QueryError::unbound_relation(&self.name, key))?;
        self.fk_value = Some(value);
        Ok(())
    }

    fn parent_key_column<'a>(&'a self, owner: &'a ModelDef) -> &'a str {
        match self.kind {
            RelationKind::BelongsTo => &self.foreign_key,
            _ => owner.identity(),
        }
    }

    /// The column the fetch constraint applies to.
    ///
    /// Table-qualified for BelongsToMany, where the constraint targets the
    /// join table rather than the target table.
    pub fn constraint_column(&self) -> String {
        match self.kind {
            RelationKind::HasOne | RelationKind::HasMany => self.foreign_key.clone(),
            RelationKind::BelongsTo => self.target_identity.clone(),
            RelationKind::BelongsToMany => format!(
                "{}.{}",
                self.join_table.as_deref().unwrap_or_default(),
                self.other_key.as_deref().unwrap_or_default()
            ),
        }
    }

    /// The join applied for a many-to-many fetch, as
    /// `(table, left, op, right)`.
    pub fn join_clause(&self) -> Option<(String, String, String, String)> {
        match self.kind {
            RelationKind::BelongsToMany => {
                let join = self.join_table.as_deref().unwrap_or_default();
                Some((
                    join.to_string(),
                    format!("{}.{}", self.target_table, self.target_identity),
                    "=".to_string(),
                    format!("{}.{}", join, self.foreign_key),
                ))
            }
            _ => None,
        }
    }

    /// The select list for a relation fetch.
    ///
    /// Many-to-many fetches select the target's columns plus the join-table
    /// key columns under the pivot prefix, plus any declared pivot columns.
    pub fn select_columns(&self) -> Vec<SelectColumn> {
        match self.kind {
            RelationKind::BelongsToMany => {
                let join = self.join_table.as_deref().unwrap_or_default();
                let other = self.other_key.as_deref().unwrap_or_default();
                let mut columns = vec![
                    SelectColumn::table_star(&self.target_table),
                    SelectColumn::aliased(
                        format!("{}.{}", join, self.foreign_key),
                        format!("{}{}", PIVOT_PREFIX, self.foreign_key),
                    ),
                    SelectColumn::aliased(
                        format!("{}.{}", join, other),
                        format!("{}{}", PIVOT_PREFIX, other),
                    ),
                ];
                columns.extend(self.pivot_columns.iter().map(|p| {
                    SelectColumn::aliased(format!("{}.{}", join, p.column), p.alias.clone())
                }));
                columns
            }
            _ => vec![SelectColumn::table_star(&self.target_table)],
        }
    }

    /// The child-row column matched against a parent's key.
    pub fn child_key_column(&self) -> String {
        match self.kind {
            RelationKind::HasOne | RelationKind::HasMany => self.foreign_key.clone(),
            RelationKind::BelongsTo => self.target_identity.clone(),
            RelationKind::BelongsToMany => format!(
                "{}{}",
                PIVOT_PREFIX,
                self.other_key.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Extend the pivot-column list.
    ///
    /// Effective only before the relation is fetched; an already-resolved
    /// relation is unaffected.
    pub fn extend_pivot(&mut self, columns: impl IntoIterator<Item = PivotColumn>) {
        self.pivot_columns.extend(columns);
    }
}
