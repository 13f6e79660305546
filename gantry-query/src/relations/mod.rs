//! Relation descriptors, eager resolution, and pivot operations.
//!
//! - [`RelationDef`] — the declarative descriptor built per relation access
//! - [`EagerLoader`] — batched resolution of dotted relation paths
//! - [`PivotOps`] — join-table attach/detach for many-to-many relations

mod eager;
mod pivot;
pub(crate) mod spec;

pub use eager::EagerLoader;
pub use pivot::{AttachItem, PivotOps};
pub use spec::{PivotColumn, RelationDef, RelationKind, PIVOT_PREFIX};
