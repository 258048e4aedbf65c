use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::schema::Schema;

/// Read-only lookup of schemas by type name.
///
/// Relation expansion resolves targets through this trait, so callers can pass
/// a plain map or a [`SchemaRegistry`].
pub trait SchemaLookup {
    fn lookup(&self, name: &str) -> Option<&Schema>;
}

impl SchemaLookup for HashMap<String, Schema> {
    fn lookup(&self, name: &str) -> Option<&Schema> {
        self.get(name)
    }
}

impl SchemaLookup for BTreeMap<String, Schema> {
    fn lookup(&self, name: &str) -> Option<&Schema> {
        self.get(name)
    }
}

impl<T: SchemaLookup + ?Sized> SchemaLookup for &T {
    fn lookup(&self, name: &str) -> Option<&Schema> {
        (**self).lookup(name)
    }
}

/// Schemas keyed by type name, owned by whoever composes the pipeline.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own name, returning the one it replaced.
    pub fn register(&mut self, schema: Schema) -> Option<Schema> {
        debug!(schema = %schema.name, "schema registered");
        self.schemas.insert(schema.name.clone(), schema)
    }

    /// Schema registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Unregister `name`, returning the schema if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Schema> {
        self.schemas.remove(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaLookup for SchemaRegistry {
    fn lookup(&self, name: &str) -> Option<&Schema> {
        self.get(name)
    }
}

impl FromIterator<Schema> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = Schema>>(iter: I) -> Self {
        let mut registry = SchemaRegistry::new();
        for schema in iter {
            registry.register(schema);
        }
        registry
    }
}
