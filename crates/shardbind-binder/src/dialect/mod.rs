//! Built-in dialect statement extractors

pub mod sqlserver;

pub use sqlserver::SqlServerStatementExtractor;
