//! Dialect database metadata
//!
//! Facts about a dialect that do not depend on a connection, such as the
//! schema an unqualified table lives in.

/// Per-dialect metadata capability
pub trait DialectDatabaseMetaData: Send + Sync {
    /// Schema used when a statement does not qualify a table, if the dialect
    /// has a fixed one
    fn default_schema(&self) -> Option<&str> {
        None
    }
}

/// MySQL has no schema level below the database
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDatabaseMetaData;

impl DialectDatabaseMetaData for MySqlDatabaseMetaData {}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlDatabaseMetaData;

impl DialectDatabaseMetaData for PostgreSqlDatabaseMetaData {
    fn default_schema(&self) -> Option<&str> {
        Some("public")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDatabaseMetaData;

impl DialectDatabaseMetaData for SqlServerDatabaseMetaData {
    fn default_schema(&self) -> Option<&str> {
        Some("dbo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_default_schemas() {
        assert_eq!(MySqlDatabaseMetaData.default_schema(), None);
        assert_eq!(PostgreSqlDatabaseMetaData.default_schema(), Some("public"));
        assert_eq!(SqlServerDatabaseMetaData.default_schema(), Some("dbo"));
    }
}
