//! Error types for the validation module.

use thiserror::Error;

/// Result type alias for validation operations.
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Errors that can occur while validating.
///
/// Structural problems in a document are never errors here; they are
/// reported through [`crate::ValidationResult`].
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Schema does not compile: {0}")]
    SchemaCompile(String),

    #[error("Core error: {0}")]
    Core(#[from] bsb_core::CoreError),
}
