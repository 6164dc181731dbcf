//! Plugin registries keyed by database type name
//!
//! Capabilities that vary per dialect (metadata, grammar engines, statement
//! extractors) are registered once at startup under a database type name and
//! only read afterwards.

use crate::database_type::DatabaseType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A map from database type name to a shared capability
pub struct TypedRegistry<T: ?Sized> {
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> TypedRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a capability for a database type name
    ///
    /// A later registration under the same name replaces the earlier one;
    /// the replaced value is returned.
    pub fn register(&mut self, database_type: impl Into<String>, value: Arc<T>) -> Option<Arc<T>> {
        self.entries.insert(database_type.into(), value)
    }

    /// Look up a capability by exact database type name
    pub fn get(&self, database_type: &str) -> Option<&Arc<T>> {
        self.entries.get(database_type)
    }

    /// Look up a capability for a database type, falling back to its trunk
    pub fn find(&self, database_type: &DatabaseType) -> Option<&Arc<T>> {
        self.get(database_type.name()).or_else(|| {
            database_type
                .trunk_name()
                .and_then(|trunk| self.get(trunk))
        })
    }

    /// Registered database type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for TypedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for TypedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for TypedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRegistry")
            .field("database_types", &self.names())
            .finish()
    }
}
