//! Structural validation of deployment templates.

use tracing::debug;

use bsb_core::{DeploymentTemplate, Dialect};

use crate::result::ValidationResult;

/// Validator for deployment templates.
///
/// A `$schema` that does not reference a deployment-template schema is a
/// warning, never an error: the lenient policy is applied everywhere.
pub struct TemplateValidator;

impl TemplateValidator {
    /// Validate a deployment template.
    pub fn validate(template: &DeploymentTemplate) -> ValidationResult {
        let mut result = ValidationResult::for_dialect(Dialect::Template);

        match template.schema_uri() {
            None => result.add_error("Missing $schema - required for ARM templates"),
            Some(_) if !template.references_deployment_template() => {
                result.add_warning("Schema may not be for ARM deployment template")
            }
            Some(_) => {}
        }

        match template.content_version() {
            Some(version) => result.add_info(format!("Content Version: {}", version)),
            None => result.add_error("Missing contentVersion - required for ARM templates"),
        }

        match template.resources() {
            Some(resources) => {
                result.add_info(format!("Template contains {} resource(s)", resources.len()));
                for (index, resource) in resources.iter().enumerate() {
                    if resource.get("type").and_then(|v| v.as_str()).is_none() {
                        result.add_warning(format!("Resource #{} has no type", index + 1));
                    }
                    if resource.get("apiVersion").and_then(|v| v.as_str()).is_none() {
                        result.add_warning(format!("Resource #{} has no apiVersion", index + 1));
                    }
                }
            }
            None => result.add_error("Missing or invalid resources array"),
        }

        if let Some(parameters) = template.parameters() {
            result.add_info(format!("Template has {} parameter(s)", parameters.len()));
        }
        if let Some(variables) = template.variables() {
            result.add_info(format!("Template has {} variable(s)", variables.len()));
        }
        if let Some(outputs) = template.outputs() {
            result.add_info(format!("Template has {} output(s)", outputs.len()));
        }

        debug!(
            "Template validation finished: {} errors, {} warnings",
            result.errors().len(),
            result.warnings().len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn validate(value: Value) -> ValidationResult {
        TemplateValidator::validate(&DeploymentTemplate::from_value(value))
    }

    #[test]
    fn test_valid_template() {
        let result = validate(json!({
            "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
            "contentVersion": "1.0.0.0",
            "parameters": { "vmName": { "type": "string" } },
            "variables": {},
            "resources": [
                { "type": "Microsoft.Compute/virtualMachines", "apiVersion": "2022-08-01" }
            ],
            "outputs": {}
        }));

        assert!(result.is_valid(), "{:?}", result.errors());
        assert!(result.warnings().is_empty());
        assert!(result.info().iter().any(|i| i == "Template has 1 parameter(s)"));
        assert!(result.info().iter().any(|i| i == "Template has 0 variable(s)"));
        assert!(result.info().iter().any(|i| i == "Template has 0 output(s)"));
    }

    #[test]
    fn test_missing_everything() {
        let result = validate(json!({}));
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 3);
    }

    #[test]
    fn test_foreign_schema_is_warning() {
        let result = validate(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "contentVersion": "1.0.0.0",
            "resources": []
        }));
        assert!(result.is_valid());
        assert!(result.warnings().iter().any(|w| w.contains("deployment template")));
    }

    #[test]
    fn test_resources_not_a_sequence() {
        let result = validate(json!({
            "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
            "contentVersion": "1.0.0.0",
            "resources": { "not": "an array" }
        }));
        assert!(!result.is_valid());
        assert!(result.errors().iter().any(|e| e.contains("resources")));
    }
}
