//! Crate-level failures. Validation findings are not errors in this sense;
//! they are `EdmError` diagnostics returned as data.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown EDM version '{0}'")]
    UnknownVersion(String),
    #[error("Invalid validation settings: {0}")]
    InvalidSettings(String),
    #[error("Report serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::InvalidSettings(e.to_string())
    }
}
