//! Structural validation of JSON Schema resource descriptions.

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

use bsb_core::{Dialect, ResourceSchema};

use crate::result::ValidationResult;

/// Top-level properties that mark a schema as describing an ARM resource.
const ARM_RESOURCE_PROPERTIES: [&str; 5] = ["apiVersion", "type", "name", "location", "properties"];

/// Validator for resource schemas.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a resource schema.
    ///
    /// Only a missing `type` is an error; every other gap degrades to a
    /// warning. Info always reports the declared type and property count.
    pub fn validate(schema: &ResourceSchema) -> ValidationResult {
        let mut result = ValidationResult::for_dialect(Dialect::ResourceSchema);

        if schema.schema_uri().is_none() {
            result.add_warning("Missing $schema property - recommended for JSON Schema validation");
        }

        let declared_type = schema.declared_type_name();
        if declared_type.is_none() {
            result.add_error("Missing required \"type\" property");
        }

        if schema.title().is_none() && schema.description().is_none() {
            result.add_warning("Consider adding title or description for better documentation");
        }

        if let Some(api_version) = schema.property("apiVersion") {
            if !has_keyword(api_version, "enum") && !has_keyword(api_version, "pattern") {
                result.add_warning(
                    "apiVersion should constrain allowed values with enum or pattern",
                );
            }
        }

        if let Some(name) = schema.property("name") {
            if !has_keyword(name, "pattern") && !has_keyword(name, "minLength") {
                result.add_warning("Consider adding validation pattern or minLength for resource name");
            }
        }

        if let Err(message) = compile_check(schema.as_value()) {
            result.add_warning(format!("Schema does not compile as JSON Schema: {}", message));
        }

        result.add_info(format!(
            "Schema type: {}",
            declared_type.as_deref().unwrap_or("unknown")
        ));
        let property_count = schema.properties().map(|p| p.len()).unwrap_or(0);
        result.add_info(format!("Properties defined: {}", property_count));

        if let Some(properties) = schema.properties() {
            let detected: Vec<_> = ARM_RESOURCE_PROPERTIES
                .iter()
                .filter(|name| properties.contains_key(**name))
                .copied()
                .collect();
            if !detected.is_empty() {
                result.add_info(format!("Bicep properties detected: {}", detected.join(", ")));
            }
        }

        debug!(
            "Schema validation finished: {} errors, {} warnings",
            result.errors().len(),
            result.warnings().len()
        );
        result
    }
}

fn has_keyword(schema: &Value, keyword: &str) -> bool {
    schema.get(keyword).map(|v| !v.is_null()).unwrap_or(false)
}

/// Compile the document as a JSON Schema. Only object and boolean roots are
/// schemas at all; other shapes are already covered by the `type` check.
fn compile_check(value: &Value) -> Result<(), String> {
    if !(value.is_object() || value.is_boolean()) {
        return Ok(());
    }
    JSONSchema::compile(value).map(|_| ()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: Value) -> ValidationResult {
        SchemaValidator::validate(&ResourceSchema::from_value(value))
    }

    #[test]
    fn test_missing_type_is_error() {
        let result = validate(json!({ "title": "No type" }));
        assert!(!result.is_valid());
        assert!(result.errors().iter().any(|e| e.contains("type")));
    }

    #[test]
    fn test_minimal_object_schema() {
        let result = validate(json!({ "type": "object" }));
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 2);
        assert!(result.warnings()[0].contains("$schema"));
        assert!(result.warnings()[1].contains("title or description"));
    }

    #[test]
    fn test_info_always_reported() {
        let result = validate(json!({ "description": "x" }));
        assert!(result.info().iter().any(|i| i == "Schema type: unknown"));
        assert!(result.info().iter().any(|i| i == "Properties defined: 0"));
    }

    #[test]
    fn test_unconstrained_api_version_and_name() {
        let result = validate(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "title": "Storage",
            "properties": {
                "apiVersion": { "type": "string" },
                "name": { "type": "string" }
            }
        }));
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 2);
        assert!(result.warnings().iter().any(|w| w.contains("apiVersion")));
        assert!(result.warnings().iter().any(|w| w.contains("resource name")));
        assert!(result
            .info()
            .iter()
            .any(|i| i == "Bicep properties detected: apiVersion, name"));
    }

    #[test]
    fn test_constrained_properties_pass_quietly() {
        let result = validate(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "title": "Storage",
            "properties": {
                "apiVersion": { "type": "string", "enum": ["2022-05-01"] },
                "name": { "type": "string", "pattern": "^[a-z0-9]{3,24}$" }
            }
        }));
        assert!(result.is_valid());
        assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    }

    #[test]
    fn test_odd_input_does_not_panic() {
        let result = validate(json!([1, 2, 3]));
        assert!(!result.is_valid());

        let result = validate(json!({ "type": 42, "properties": "nope", "title": 7 }));
        assert!(result.is_valid());
        assert!(result.info().iter().any(|i| i == "Properties defined: 0"));
    }
}
