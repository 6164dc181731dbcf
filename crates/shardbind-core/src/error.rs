//! Error taxonomy
//!
//! IMPORTANT: Error codes are stable.
//! NEVER rename or remove codes - callers match on them.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Error code registry (v1)
///
/// These codes are STABLE. Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // SQL input
    /// No grammar engine could parse the SQL text
    SqlParsing,

    // Database types
    /// No registered database type accepts the URL
    UnsupportedStorageType,

    /// No registered database type has the requested name
    UnknownDatabaseType,

    /// A database type name was registered twice
    DuplicateDatabaseType,

    /// A branch type names a trunk that is missing or is itself a branch
    InvalidTrunkDatabaseType,

    // Rule configuration
    /// A read/write-splitting rule references a read storage unit that does not exist
    MissingRequiredReadStorageUnit,
}

impl ErrorCode {
    /// Get the error code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlParsing => "SQL_PARSING",
            Self::UnsupportedStorageType => "UNSUPPORTED_STORAGE_TYPE",
            Self::UnknownDatabaseType => "UNKNOWN_DATABASE_TYPE",
            Self::DuplicateDatabaseType => "DUPLICATE_DATABASE_TYPE",
            Self::InvalidTrunkDatabaseType => "INVALID_TRUNK_DATABASE_TYPE",
            Self::MissingRequiredReadStorageUnit => "MISSING_REQUIRED_READ_STORAGE_UNIT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of failure an error represents
///
/// Every category is terminal for the request: nothing here is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The SQL text is not valid under any registered grammar
    InputRejected,

    /// A referenced database type or storage unit does not exist
    ConfigurationMismatch,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputRejected => write!(f, "input rejected"),
            Self::ConfigurationMismatch => write!(f, "configuration mismatch"),
        }
    }
}

/// Errors raised while resolving database types, parsing and binding SQL,
/// and checking rule configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShardbindError {
    #[error("Unsupported storage type of URL '{url}'")]
    UnsupportedStorageType { url: String },

    #[error("{reason}: `{sql}`")]
    SqlParsing { sql: String, reason: String },

    #[error("Read storage unit '{storage_unit}' does not exist in rule '{rule}'")]
    MissingRequiredReadStorageUnit { rule: String, storage_unit: String },

    #[error("Unknown database type: {name}")]
    UnknownDatabaseType { name: String },

    #[error("Database type '{name}' is already registered")]
    DuplicateDatabaseType { name: String },

    #[error("Database type '{name}' declares '{trunk}' as trunk, which is not a registered trunk type")]
    InvalidTrunkDatabaseType { name: String, trunk: String },
}

impl ShardbindError {
    /// Create a parsing failure for the given SQL text
    pub fn sql_parsing(sql: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SqlParsing {
            sql: sql.into(),
            reason: reason.into(),
        }
    }

    /// Get the stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedStorageType { .. } => ErrorCode::UnsupportedStorageType,
            Self::SqlParsing { .. } => ErrorCode::SqlParsing,
            Self::MissingRequiredReadStorageUnit { .. } => ErrorCode::MissingRequiredReadStorageUnit,
            Self::UnknownDatabaseType { .. } => ErrorCode::UnknownDatabaseType,
            Self::DuplicateDatabaseType { .. } => ErrorCode::DuplicateDatabaseType,
            Self::InvalidTrunkDatabaseType { .. } => ErrorCode::InvalidTrunkDatabaseType,
        }
    }

    /// Get the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SqlParsing { .. } => ErrorCategory::InputRejected,
            _ => ErrorCategory::ConfigurationMismatch,
        }
    }

    /// The offending SQL text, for parsing failures
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::SqlParsing { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Result alias used across the shardbind crates
pub type Result<T> = std::result::Result<T, ShardbindError>;
