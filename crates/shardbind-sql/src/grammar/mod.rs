//! Grammar engines
//!
//! A grammar engine turns SQL text into a raw parse tree, or reports why it
//! could not. Structural rejection (`Cancelled`) is expected and lets the
//! parser engine try the next grammar; anything else (`Internal`) is fatal.
//!
//! Standard engines wrap a `sqlparser` dialect and are registered per database
//! type. Feature grammars cover syntax no standard engine accepts (DistSQL,
//! MySQL `LOAD XML`, SQLServer `DENY`) and are tried in registration order.

pub mod dialect;
pub mod distsql;
pub mod mysql;
pub mod sqlserver;
mod tokens;

use crate::engine::SqlStatementParserEngine;
use crate::tree::ParseTree;
use shardbind_core::{DatabaseType, FeatureConfig, TypedRegistry};
use std::fmt;
use std::sync::Arc;

pub use dialect::DialectGrammar;
pub use distsql::{DistSqlGrammar, ReadwriteSplittingGrammar};
pub use mysql::LoadXmlGrammar;
pub use sqlserver::DenyGrammar;

/// Feature name of the DistSQL storage unit grammar
pub const DIST_SQL: &str = "dist-sql";
/// Feature name of the read/write-splitting rule grammar
pub const READWRITE_SPLITTING: &str = "readwrite-splitting";
/// Feature name of the MySQL `LOAD XML` grammar
pub const MYSQL_LOAD_XML: &str = "mysql-load-xml";
/// Feature name of the SQLServer `DENY` grammar
pub const SQLSERVER_DENY: &str = "sqlserver-deny";

/// Why a grammar engine produced no tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarFailure {
    /// The input is not valid under this grammar
    #[error("Parse cancelled: {0}")]
    Cancelled(String),

    /// The engine itself failed
    #[error("Internal grammar engine error: {0}")]
    Internal(String),
}

/// A grammar capable of parsing SQL text into a raw tree
pub trait GrammarEngine: Send + Sync {
    /// Engine name used in logs
    fn name(&self) -> &str;

    /// Attempt to parse `sql`
    fn try_parse(&self, sql: &str) -> Result<ParseTree, GrammarFailure>;
}

/// Database types a feature grammar applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureScope {
    /// Every database type
    Any,

    /// A database type and all its branches
    DatabaseType(String),
}

/// A pluggable feature grammar
#[derive(Clone)]
pub struct FeatureGrammar {
    feature: String,
    scope: FeatureScope,
    engine: Arc<dyn GrammarEngine>,
}

impl FeatureGrammar {
    pub fn new(feature: impl Into<String>, scope: FeatureScope, engine: Arc<dyn GrammarEngine>) -> Self {
        Self {
            feature: feature.into(),
            scope,
            engine,
        }
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn scope(&self) -> &FeatureScope {
        &self.scope
    }

    pub fn engine(&self) -> &Arc<dyn GrammarEngine> {
        &self.engine
    }

    /// Check if this grammar may be tried for `database_type`
    pub fn applies_to(&self, database_type: &DatabaseType) -> bool {
        match &self.scope {
            FeatureScope::Any => true,
            FeatureScope::DatabaseType(name) => {
                name == database_type.name() || Some(name.as_str()) == database_type.trunk_name()
            }
        }
    }
}

impl fmt::Debug for FeatureGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureGrammar")
            .field("feature", &self.feature)
            .field("scope", &self.scope)
            .field("engine", &self.engine.name())
            .finish()
    }
}

/// Standard engines per database type plus the ordered feature grammars
pub struct GrammarRegistry {
    standard: TypedRegistry<dyn GrammarEngine>,

    /// Used when neither a type nor its trunk has a standard engine
    generic: Arc<dyn GrammarEngine>,

    /// Feature grammars, in registration order
    features: Vec<FeatureGrammar>,
}

impl GrammarRegistry {
    /// Create a registry with only the generic standard engine
    pub fn new() -> Self {
        Self {
            standard: TypedRegistry::new(),
            generic: Arc::new(DialectGrammar::generic()),
            features: Vec::new(),
        }
    }

    /// Create a registry with every built-in grammar
    pub fn builtin() -> Self {
        Self::from_config(&FeatureConfig::default())
    }

    /// Create a registry with the built-in grammars, skipping disabled features
    pub fn from_config(features: &FeatureConfig) -> Self {
        let mut registry = Self::new();

        registry.register_standard("SQL92", Arc::new(DialectGrammar::ansi()));
        registry.register_standard("MySQL", Arc::new(DialectGrammar::mysql()));
        registry.register_standard("PostgreSQL", Arc::new(DialectGrammar::postgres()));
        registry.register_standard("SQLServer", Arc::new(DialectGrammar::sqlserver()));
        registry.register_standard("H2", Arc::new(DialectGrammar::generic()));
        registry.register_standard("ClickHouse", Arc::new(DialectGrammar::clickhouse()));
        registry.register_standard("Hive", Arc::new(DialectGrammar::hive()));

        let builtin_features = [
            FeatureGrammar::new(DIST_SQL, FeatureScope::Any, Arc::new(DistSqlGrammar)),
            FeatureGrammar::new(READWRITE_SPLITTING, FeatureScope::Any, Arc::new(ReadwriteSplittingGrammar)),
            FeatureGrammar::new(
                MYSQL_LOAD_XML,
                FeatureScope::DatabaseType("MySQL".to_string()),
                Arc::new(LoadXmlGrammar),
            ),
            FeatureGrammar::new(
                SQLSERVER_DENY,
                FeatureScope::DatabaseType("SQLServer".to_string()),
                Arc::new(DenyGrammar),
            ),
        ];

        for feature in builtin_features {
            if features.is_enabled(feature.feature()) {
                registry.register_feature(feature);
            } else {
                tracing::debug!(feature = feature.feature(), "Feature grammar disabled by config");
            }
        }

        registry
    }

    /// Register the standard engine for a database type name
    pub fn register_standard(
        &mut self,
        database_type: impl Into<String>,
        engine: Arc<dyn GrammarEngine>,
    ) -> Option<Arc<dyn GrammarEngine>> {
        self.standard.register(database_type, engine)
    }

    /// Register a feature grammar
    ///
    /// New features are appended; re-registering a feature name replaces it
    /// in place so the fallback order stays stable.
    pub fn register_feature(&mut self, feature: FeatureGrammar) {
        match self.features.iter_mut().find(|each| each.feature == feature.feature) {
            Some(existing) => {
                tracing::debug!(feature = feature.feature(), "Replacing feature grammar");
                *existing = feature;
            }
            None => {
                tracing::debug!(feature = feature.feature(), "Registered feature grammar");
                self.features.push(feature);
            }
        }
    }

    /// Standard engine for a database type (exact, then trunk, then generic)
    pub fn standard_for(&self, database_type: &DatabaseType) -> Arc<dyn GrammarEngine> {
        self.standard
            .find(database_type)
            .cloned()
            .unwrap_or_else(|| self.generic.clone())
    }

    /// Feature grammars applicable to a database type, in registration order
    pub fn features_for(&self, database_type: &DatabaseType) -> Vec<&FeatureGrammar> {
        self.features
            .iter()
            .filter(|feature| feature.applies_to(database_type))
            .collect()
    }

    pub fn features(&self) -> &[FeatureGrammar] {
        &self.features
    }

    /// Build the parser engine for a database type
    pub fn parser_for(&self, database_type: &DatabaseType) -> SqlStatementParserEngine {
        let features = self
            .features_for(database_type)
            .into_iter()
            .map(|feature| feature.engine.clone())
            .collect();

        SqlStatementParserEngine::new(self.standard_for(database_type), features)
    }

    /// Build a parser engine for DistSQL only
    ///
    /// The storage unit grammar is the standard engine; database-independent
    /// rule grammars are the fallbacks.
    pub fn dist_sql_parser(&self) -> SqlStatementParserEngine {
        let features = self
            .features
            .iter()
            .filter(|feature| feature.scope == FeatureScope::Any && feature.feature != DIST_SQL)
            .map(|feature| feature.engine.clone())
            .collect();

        SqlStatementParserEngine::new(Arc::new(DistSqlGrammar), features)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarRegistry")
            .field("standard", &self.standard)
            .field("features", &self.features)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardbind_core::DatabaseTypeRegistry;

    fn feature_names(features: &[&FeatureGrammar]) -> Vec<String> {
        features.iter().map(|f| f.feature().to_string()).collect()
    }

    #[test]
    fn builtin_feature_order() {
        let registry = GrammarRegistry::builtin();
        let names: Vec<&str> = registry.features().iter().map(FeatureGrammar::feature).collect();

        assert_eq!(names, vec![DIST_SQL, READWRITE_SPLITTING, MYSQL_LOAD_XML, SQLSERVER_DENY]);
    }

    #[test]
    fn scoped_features_follow_trunk() {
        let types = DatabaseTypeRegistry::builtin();
        let registry = GrammarRegistry::builtin();

        let mariadb = types.get_by_name("MariaDB").unwrap();
        let postgres = types.get_by_name("PostgreSQL").unwrap();
        let sqlserver = types.get_by_name("SQLServer").unwrap();

        assert_eq!(
            feature_names(&registry.features_for(mariadb)),
            vec![DIST_SQL, READWRITE_SPLITTING, MYSQL_LOAD_XML]
        );
        assert_eq!(feature_names(&registry.features_for(postgres)), vec![DIST_SQL, READWRITE_SPLITTING]);
        assert_eq!(
            feature_names(&registry.features_for(sqlserver)),
            vec![DIST_SQL, READWRITE_SPLITTING, SQLSERVER_DENY]
        );
    }

    #[test]
    fn standard_engine_resolution() {
        let types = DatabaseTypeRegistry::builtin();
        let registry = GrammarRegistry::builtin();

        let open_gauss = types.get_by_name("openGauss").unwrap();
        let oracle = types.get_by_name("Oracle").unwrap();

        assert_eq!(registry.standard_for(open_gauss).name(), "PostgreSQL");
        assert_eq!(registry.standard_for(oracle).name(), "Generic");
    }

    #[test]
    fn disabled_features_are_skipped() {
        let config = FeatureConfig {
            disabled: vec!["Readwrite-Splitting".to_string()],
        };
        let registry = GrammarRegistry::from_config(&config);
        let names: Vec<&str> = registry.features().iter().map(FeatureGrammar::feature).collect();

        assert_eq!(names, vec![DIST_SQL, MYSQL_LOAD_XML, SQLSERVER_DENY]);
    }

    #[test]
    fn re_registered_feature_keeps_position() {
        let mut registry = GrammarRegistry::builtin();
        registry.register_feature(FeatureGrammar::new(
            DIST_SQL,
            FeatureScope::DatabaseType("MySQL".to_string()),
            Arc::new(DistSqlGrammar),
        ));

        assert_eq!(registry.features().len(), 4);
        assert_eq!(registry.features()[0].feature(), DIST_SQL);
        assert_eq!(
            registry.features()[0].scope(),
            &FeatureScope::DatabaseType("MySQL".to_string())
        );
    }
}
