//! shardbind core
//!
//! Database type registry, dialect metadata, configuration and the error
//! taxonomy shared by the parsing and binding crates.
//! Never rename error codes - they are part of the public API.

pub mod config;
pub mod database_type;
pub mod error;
pub mod metadata;
pub mod registry;

pub use config::{Config, ConfigError, FeatureConfig};
pub use database_type::{DatabaseType, DatabaseTypeRegistry};
pub use error::{ErrorCategory, ErrorCode, Result, ShardbindError};
pub use metadata::DialectDatabaseMetaData;
pub use registry::TypedRegistry;
