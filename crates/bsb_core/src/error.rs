//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid JSON input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unrecognized input: {0}")]
    UnrecognizedInput(String),

    #[error("Missing required configuration: {}", fields.join(", "))]
    MissingConfiguration { fields: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cloud metadata provider error: {0}")]
    Metadata(String),

    #[error("Cloud metadata provider is not authenticated")]
    NotAuthenticated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
