//! Error types for the IaC module.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur while generating, converting or assembling.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Template has not been analyzed; run analysis before conversion")]
    NotAnalyzed,

    #[error("No resources selected; select at least one resource to assemble")]
    EmptySelection,

    #[error("Failed to load schema '{name}': {message}")]
    SchemaSource { name: String, message: String },

    #[error("Core error: {0}")]
    Core(#[from] bsb_core::CoreError),

    #[error("Validation error: {0}")]
    Validate(#[from] bsb_validate::ValidateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IacError {
    pub fn schema_source(name: impl Into<String>, message: impl ToString) -> Self {
        IacError::SchemaSource {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
