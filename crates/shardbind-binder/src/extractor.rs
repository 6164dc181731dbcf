//! Dialect statement extractors
//!
//! Some statements only exist in one dialect and carry tables the canonical
//! structure does not expose generically (SQLServer `DENY`). An extractor
//! registered under a database type name pulls those tables out.

use crate::dialect::SqlServerStatementExtractor;
use shardbind_core::TypedRegistry;
use shardbind_sql::{Statement, TableReference};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Extracts dialect-specific tables from a statement
pub trait DialectStatementExtractor: Send + Sync {
    /// Name of the database type this extractor serves
    fn database_type(&self) -> &str;

    /// Tables of the statement, or nothing for statements it does not recognize
    fn extract_tables(&self, statement: &Statement) -> Vec<TableReference>;
}

/// Extractors keyed by database type name
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    extractors: TypedRegistry<dyn DialectStatementExtractor>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in extractors
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SqlServerStatementExtractor));
        registry
    }

    /// Register an extractor under its database type name
    ///
    /// A later registration for the same name replaces the earlier one.
    pub fn register(
        &mut self,
        extractor: Arc<dyn DialectStatementExtractor>,
    ) -> Option<Arc<dyn DialectStatementExtractor>> {
        let database_type = extractor.database_type().to_string();
        let replaced = self.extractors.register(database_type.clone(), extractor);

        if replaced.is_some() {
            tracing::warn!(database_type = %database_type, "Replacing dialect statement extractor");
        } else {
            tracing::debug!(database_type = %database_type, "Registered dialect statement extractor");
        }

        replaced
    }

    /// Extractor registered for exactly this database type name
    pub fn get(&self, database_type: &str) -> Option<&Arc<dyn DialectStatementExtractor>> {
        self.extractors.get(database_type)
    }

    /// Extract dialect-specific tables; empty when no extractor is registered
    pub fn extract_tables(&self, database_type: &str, statement: &Statement) -> BTreeSet<TableReference> {
        self.get(database_type)
            .map(|extractor| extractor.extract_tables(statement).into_iter().collect())
            .unwrap_or_default()
    }

    /// Database type names with a registered extractor, sorted
    pub fn database_types(&self) -> Vec<&str> {
        self.extractors.names()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}
