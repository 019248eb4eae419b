//! Validation of resource instances against their schema.

use jsonschema::JSONSchema;
use serde_json::Value;

use bsb_core::{Dialect, ResourceSchema};

use crate::error::{ValidateError, ValidateResult};
use crate::result::ValidationResult;

/// Check an instance document against a resource schema, including its
/// `required` list. A schema that does not compile is a hard error here
/// because no meaningful result can be produced.
pub fn validate_instance(schema: &ResourceSchema, instance: &Value) -> ValidateResult<ValidationResult> {
    let compiled = JSONSchema::compile(schema.as_value())
        .map_err(|e| ValidateError::SchemaCompile(e.to_string()))?;

    let mut result = ValidationResult::for_dialect(Dialect::ResourceSchema);
    if let Err(errors) = compiled.validate(instance) {
        for error in errors {
            let path = error.instance_path.to_string();
            let location = if path.is_empty() { "(root)".to_string() } else { path };
            result.add_error(format!("{}: {}", location, error));
        }
    }

    if let Some(object) = instance.as_object() {
        result.add_info(format!("Instance has {} top-level properties", object.len()));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn storage_schema() -> ResourceSchema {
        ResourceSchema::from_value(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "type": { "const": "Microsoft.Storage/storageAccounts" },
                "apiVersion": { "enum": ["2022-05-01"] },
                "name": { "type": "string", "minLength": 3 }
            },
            "required": ["type", "apiVersion", "name"]
        }))
    }

    #[test]
    fn test_valid_instance() {
        let instance = json!({
            "type": "Microsoft.Storage/storageAccounts",
            "apiVersion": "2022-05-01",
            "name": "mystorage"
        });
        let result = validate_instance(&storage_schema(), &instance).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_missing_required_property() {
        let instance = json!({ "type": "Microsoft.Storage/storageAccounts", "apiVersion": "2022-05-01" });
        let result = validate_instance(&storage_schema(), &instance).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors().iter().any(|e| e.contains("name")));
    }

    #[test]
    fn test_uncompilable_schema() {
        let schema = ResourceSchema::from_value(json!({ "type": "not-a-type" }));
        let err = validate_instance(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, ValidateError::SchemaCompile(_)));
    }
}
