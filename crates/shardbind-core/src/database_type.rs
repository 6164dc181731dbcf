//! Database types and their registry
//!
//! A database type is identified by name and by the URL prefixes it accepts.
//! Branch types (MariaDB, openGauss, ...) point at the trunk type whose wire
//! and URL conventions they share.

use crate::error::{Result, ShardbindError};
use crate::metadata::{
    DialectDatabaseMetaData, MySqlDatabaseMetaData, PostgreSqlDatabaseMetaData,
    SqlServerDatabaseMetaData,
};
use crate::registry::TypedRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable database type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseType {
    /// Canonical name (e.g. "MySQL")
    name: String,

    /// Accepted URL prefixes, in declaration order
    url_prefixes: Vec<String>,

    /// Name of the trunk type this type is a branch of
    trunk: Option<String>,
}

impl DatabaseType {
    /// Create a trunk database type
    pub fn new<I, S>(name: impl Into<String>, url_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            url_prefixes: url_prefixes.into_iter().map(Into::into).collect(),
            trunk: None,
        }
    }

    /// Turn this type into a branch of `trunk`
    pub fn branch_of(mut self, trunk: impl Into<String>) -> Self {
        self.trunk = Some(trunk.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_prefixes(&self) -> &[String] {
        &self.url_prefixes
    }

    /// Name of the trunk type, if this is a branch
    pub fn trunk_name(&self) -> Option<&str> {
        self.trunk.as_deref()
    }

    /// Whether this type is a family root
    pub fn is_trunk(&self) -> bool {
        self.trunk.is_none()
    }

    /// Check if any accepted prefix is a prefix of `url`
    pub fn matches_url(&self, url: &str) -> bool {
        self.url_prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Built-in database types, in registration order
fn builtin_types() -> Vec<DatabaseType> {
    vec![
        DatabaseType::new("SQL92", Vec::<String>::new()),
        DatabaseType::new("MySQL", ["jdbc:mysql:", "jdbc:mysqlx:", "jdbc:tc:mysql:"]),
        DatabaseType::new("MariaDB", ["jdbc:mariadb:"]).branch_of("MySQL"),
        DatabaseType::new("PostgreSQL", ["jdbc:postgresql:", "jdbc:tc:postgresql:"]),
        DatabaseType::new("openGauss", ["jdbc:opengauss:"]).branch_of("PostgreSQL"),
        DatabaseType::new("SQLServer", ["jdbc:microsoft:sqlserver:", "jdbc:sqlserver:"]),
        DatabaseType::new("Oracle", ["jdbc:oracle:"]),
        DatabaseType::new("H2", ["jdbc:h2:"]),
        DatabaseType::new("ClickHouse", ["jdbc:ch:", "jdbc:clickhouse:"]),
        DatabaseType::new("Hive", ["jdbc:hive2:"]),
    ]
}

/// Registry of every known database type plus their dialect metadata
///
/// Populated at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DatabaseTypeRegistry {
    /// Registered types, in registration order
    types: Vec<DatabaseType>,

    /// Dialect metadata by database type name
    metadata: TypedRegistry<dyn DialectDatabaseMetaData>,
}

impl DatabaseTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in database types and metadata
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        for database_type in builtin_types() {
            // The built-in table lists every trunk before its branches
            if let Err(e) = registry.register(database_type) {
                tracing::error!("Skipping built-in database type: {}", e);
            }
        }

        registry.register_metadata("MySQL", Arc::new(MySqlDatabaseMetaData));
        registry.register_metadata("PostgreSQL", Arc::new(PostgreSqlDatabaseMetaData));
        registry.register_metadata("SQLServer", Arc::new(SqlServerDatabaseMetaData));

        registry
    }

    /// Register a database type
    ///
    /// Fails if the name is taken, or if the declared trunk is not a
    /// registered trunk type.
    pub fn register(&mut self, database_type: DatabaseType) -> Result<()> {
        if self.types.iter().any(|each| each.name == database_type.name) {
            return Err(ShardbindError::DuplicateDatabaseType {
                name: database_type.name,
            });
        }

        if let Some(trunk) = database_type.trunk_name() {
            let trunk_is_valid = self
                .types
                .iter()
                .any(|each| each.name == trunk && each.is_trunk());

            if !trunk_is_valid {
                return Err(ShardbindError::InvalidTrunkDatabaseType {
                    name: database_type.name.clone(),
                    trunk: trunk.to_string(),
                });
            }
        }

        tracing::debug!(
            database_type = %database_type.name,
            trunk = ?database_type.trunk,
            "Registered database type"
        );
        self.types.push(database_type);
        Ok(())
    }

    /// Register dialect metadata for a database type name
    pub fn register_metadata(
        &mut self,
        database_type: impl Into<String>,
        metadata: Arc<dyn DialectDatabaseMetaData>,
    ) {
        self.metadata.register(database_type, metadata);
    }

    /// Resolve a connection URL to a database type
    ///
    /// When several types accept the URL, the first trunk type wins over
    /// branch types; if every candidate is a branch, the first registered
    /// candidate is returned.
    pub fn get(&self, url: &str) -> Result<&DatabaseType> {
        let candidates: Vec<&DatabaseType> = self
            .types
            .iter()
            .filter(|each| each.matches_url(url))
            .collect();

        let first = candidates.first().copied().ok_or_else(|| {
            ShardbindError::UnsupportedStorageType {
                url: url.to_string(),
            }
        })?;

        Ok(candidates
            .iter()
            .copied()
            .find(|each| each.is_trunk())
            .unwrap_or(first))
    }

    /// Look up a database type by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<&DatabaseType> {
        self.types
            .iter()
            .find(|each| each.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ShardbindError::UnknownDatabaseType {
                name: name.to_string(),
            })
    }

    /// Get the trunk type of a branch
    pub fn get_trunk(&self, database_type: &DatabaseType) -> Option<&DatabaseType> {
        database_type
            .trunk_name()
            .and_then(|trunk| self.types.iter().find(|each| each.name == trunk))
    }

    /// Get every registered type that is a branch of `trunk`
    pub fn get_all_branch_types(&self, trunk: &DatabaseType) -> Vec<&DatabaseType> {
        self.types
            .iter()
            .filter(|each| each.trunk_name() == Some(trunk.name()))
            .collect()
    }

    /// Get the default schema name for a database
    ///
    /// Uses the dialect's fixed default schema when it declares one, otherwise
    /// the lower-cased database name.
    pub fn get_default_schema_name(
        &self,
        database_type: &DatabaseType,
        database_name: Option<&str>,
    ) -> Option<String> {
        self.metadata
            .find(database_type)
            .and_then(|metadata| metadata.default_schema().map(str::to_string))
            .or_else(|| database_name.map(str::to_lowercase))
    }

    /// Registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &DatabaseType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
