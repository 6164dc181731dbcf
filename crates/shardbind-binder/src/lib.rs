//! Statement binding
//!
//! This crate handles:
//! - Dialect statement extractors and their registry
//! - Binding parsed statements into statement contexts
//! - Read/write-splitting rule checks
//! - `SqlBindingEngine`, the entry point tying type resolution, parsing and
//!   binding together

pub mod checker;
pub mod context;
pub mod dialect;
pub mod extractor;

pub use checker::ReadwriteSplittingRuleChecker;
pub use context::{StatementContext, TableAvailable};
pub use dialect::SqlServerStatementExtractor;
pub use extractor::{DialectStatementExtractor, ExtractorRegistry};

use shardbind_core::{Config, DatabaseType, DatabaseTypeRegistry, Result};
use shardbind_sql::GrammarRegistry;

/// Resolves database types, parses SQL and binds statements
///
/// Every registry is built once and only read afterwards, so one engine can
/// be shared across threads.
#[derive(Debug)]
pub struct SqlBindingEngine {
    database_types: DatabaseTypeRegistry,
    grammars: GrammarRegistry,
    extractors: ExtractorRegistry,
    default_database_type: String,
}

impl SqlBindingEngine {
    /// Create an engine from explicit registries
    pub fn new(
        database_types: DatabaseTypeRegistry,
        grammars: GrammarRegistry,
        extractors: ExtractorRegistry,
    ) -> Self {
        Self {
            database_types,
            grammars,
            extractors,
            default_database_type: Config::default().default_database_type,
        }
    }

    /// Create an engine with every built-in registration
    pub fn builtin() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create an engine with the built-in registrations, honouring `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            database_types: DatabaseTypeRegistry::builtin(),
            grammars: GrammarRegistry::from_config(&config.features),
            extractors: ExtractorRegistry::builtin(),
            default_database_type: config.default_database_type.clone(),
        }
    }

    /// Parse SQL for a database type and bind the resulting statement
    pub fn parse_and_bind(&self, database_type: &DatabaseType, sql: &str) -> Result<StatementContext> {
        let statement = self.grammars.parser_for(database_type).parse(sql)?;
        tracing::debug!(
            database_type = database_type.name(),
            kind = statement.kind(),
            "Parsed statement"
        );

        Ok(StatementContext::bind(database_type, statement, &self.extractors))
    }

    /// Resolve a connection URL to its database type
    pub fn resolve_database_type(&self, url: &str) -> Result<&DatabaseType> {
        self.database_types.get(url)
    }

    /// The configured default database type
    pub fn default_database_type(&self) -> Result<&DatabaseType> {
        self.database_types.get_by_name(&self.default_database_type)
    }

    pub fn database_types(&self) -> &DatabaseTypeRegistry {
        &self.database_types
    }

    pub fn grammars(&self) -> &GrammarRegistry {
        &self.grammars
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }
}

impl Default for SqlBindingEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqlBindingEngine>();
    }

    #[test]
    fn default_database_type_from_config() {
        let config = Config {
            default_database_type: "postgresql".to_string(),
            ..Config::default()
        };
        let engine = SqlBindingEngine::from_config(&config);

        assert_eq!(engine.default_database_type().unwrap().name(), "PostgreSQL");
    }

    #[test]
    fn unknown_default_database_type() {
        let config = Config {
            default_database_type: "Sybase".to_string(),
            ..Config::default()
        };
        let engine = SqlBindingEngine::from_config(&config);

        assert!(engine.default_database_type().is_err());
    }
}
