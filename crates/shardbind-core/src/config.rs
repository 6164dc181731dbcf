//! Configuration schema (shardbind.toml)

use serde::{Deserialize, Serialize};

fn default_database_type() -> String {
    "MySQL".to_string()
}

/// Feature grammar toggles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Feature grammars that must not be tried during fallback parsing
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl FeatureConfig {
    /// Check if a feature grammar may be used (case-insensitive)
    pub fn is_enabled(&self, feature: &str) -> bool {
        !self
            .disabled
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(feature))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Database type used when the caller names neither a type nor a URL
    #[serde(default = "default_database_type")]
    pub default_database_type: String,

    /// Log filter directive (e.g. "debug", "shardbind_sql=trace")
    #[serde(default)]
    pub log_level: Option<String>,

    /// Feature grammar toggles
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_database_type: default_database_type(),
            log_level: None,
            features: FeatureConfig::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
