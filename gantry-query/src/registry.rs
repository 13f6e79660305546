//! Database handles and the named-database registry.
//!
//! A [`Database`] bundles the engine, the model registry, and the event
//! sink — everything an operation needs, passed explicitly. The
//! [`DatabaseRegistry`] maps names to shared database handles with explicit
//! `create`/`lookup`/`teardown` operations; it is a plain value owned by the
//! application entry point, never implicit process-wide state.
//!
//! ```rust,ignore
//! let mut models = ModelRegistry::new();
//! models.register(ModelDef::new("User", "users"));
//!
//! let db = Database::new(Arc::new(MyEngine::connect(url)?), models);
//! let registry = DatabaseRegistry::new();
//! let db = registry.create("primary", db);
//! // ...
//! let same = registry.lookup("primary").unwrap();
//! registry.teardown("primary");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::events::{EventSink, NullSink};
use crate::model::ModelRegistry;
use crate::traits::Engine;

/// One database: engine, models, and event sink.
pub struct Database {
    engine: Arc<dyn Engine>,
    models: ModelRegistry,
    events: Arc<dyn EventSink>,
}

impl Database {
    /// Create a database handle with the default (discarding) event sink.
    pub fn new(engine: Arc<dyn Engine>, models: ModelRegistry) -> Self {
        Self {
            engine,
            models,
            events: Arc::new(NullSink),
        }
    }

    /// Replace the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The query engine.
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// The model registry.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The event sink.
    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }
}

/// Registry of named database handles.
#[derive(Default)]
pub struct DatabaseRegistry {
    databases: RwLock<IndexMap<String, Arc<Database>>>,
}

impl DatabaseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database under a name, returning the shared handle.
    ///
    /// A database already registered under the name is replaced.
    pub fn create(&self, name: impl Into<String>, database: Database) -> Arc<Database> {
        let database = Arc::new(database);
        self.databases
            .write()
            .insert(name.into(), Arc::clone(&database));
        database
    }

    /// Look up a database by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.read().get(name).cloned()
    }

    /// Remove a database by name, returning its handle if it was registered.
    ///
    /// Outstanding clones of the handle stay valid; teardown only ends the
    /// registry's ownership.
    pub fn teardown(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.write().shift_remove(name)
    }

    /// Registered database names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }
}
