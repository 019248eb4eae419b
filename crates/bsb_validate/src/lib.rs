//! # bsb_validate
//!
//! Structural validation for the three dialects Bicep Schema Builder handles.
//!
//! ## Features
//!
//! - **Resource schemas**: required keywords, documentation and constraint hints
//! - **Deployment templates**: `$schema`, `contentVersion` and resource entries
//! - **Bicep code**: declaration counts and bracket balance
//! - **Instances**: full JSON Schema evaluation of a resource instance
//! - **Resource types**: existence and API version checks, live or offline
//!
//! Validators never fail on malformed documents. Problems are collected in a
//! [`ValidationResult`]; a document is valid exactly when no error was
//! recorded.
//!
//! ## Example
//!
//! ```rust
//! use bsb_core::Input;
//! use bsb_validate::validate_input;
//!
//! let input = Input::classify(r#"{"type": "object", "title": "Storage"}"#).unwrap();
//! let result = validate_input(&input);
//! assert!(result.is_valid());
//! ```

pub mod bicep;
pub mod error;
pub mod instance;
pub mod resource_type;
pub mod result;
pub mod schema;
pub mod template;

use tracing::debug;

use bsb_core::Input;

pub use bicep::validate_bicep;
pub use error::{ValidateError, ValidateResult};
pub use instance::validate_instance;
pub use resource_type::{
    scaffold_schema, similar_resource_types, ResourceTypeValidation, ResourceTypeValidator,
    ValidationSource,
};
pub use result::ValidationResult;
pub use schema::SchemaValidator;
pub use template::TemplateValidator;

/// Validate a classified input with the validator for its dialect.
pub fn validate_input(input: &Input) -> ValidationResult {
    debug!("Validating {} input", input.dialect());
    match input {
        Input::ResourceSchema(schema) => SchemaValidator::validate(schema),
        Input::Template(template) => TemplateValidator::validate(template),
        Input::Bicep(code) => validate_bicep(code),
    }
}
