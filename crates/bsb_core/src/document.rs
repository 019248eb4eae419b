//! Input documents: resource schemas, deployment templates and generated code.
//!
//! Documents are kept as raw JSON values with typed accessors rather than
//! strict serde structs. User-authored schemas are frequently incomplete or
//! oddly shaped, and validation must report that instead of failing to load.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{CoreError, CoreResult};

/// Resource type used when a schema does not name one.
pub const NESTED_DEPLOYMENT_TYPE: &str = "Microsoft.Resources/deployments";

/// Substring identifying a deployment-template `$schema` URI.
pub const DEPLOYMENT_TEMPLATE_MARKER: &str = "deploymentTemplate";

/// Canonical deployment template schema URI.
pub const DEPLOYMENT_TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";

/// Canonical deployment parameters schema URI.
pub const DEPLOYMENT_PARAMETERS_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentParameters.json#";

/// A JSON Schema document describing one cloud resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema(Value);

impl ResourceSchema {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a resource schema from JSON text.
    pub fn parse(text: &str) -> CoreResult<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn schema_uri(&self) -> Option<&str> {
        self.0.get("$schema").and_then(Value::as_str)
    }

    /// The raw `type` keyword, which may be a string or an array of strings.
    pub fn declared_type(&self) -> Option<&Value> {
        self.0.get("type").filter(|v| !v.is_null())
    }

    /// Human-readable rendition of the `type` keyword.
    pub fn declared_type_name(&self) -> Option<String> {
        match self.declared_type()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(" | "),
            ),
            other => Some(other.to_string()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        non_empty_str(self.0.get("title"))
    }

    pub fn description(&self) -> Option<&str> {
        non_empty_str(self.0.get("description"))
    }

    /// Top-level `properties` mapping, if it is an object.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties().and_then(|p| p.get(name))
    }

    /// Schemas of the resource's own `properties` bag
    /// (`properties.properties.properties`).
    pub fn resource_properties(&self) -> Option<&Map<String, Value>> {
        self.property("properties")
            .and_then(|p| p.get("properties"))
            .and_then(Value::as_object)
    }

    /// Resource type identifier from `properties.type.const`, falling back to
    /// the first entry of `properties.type.enum`.
    pub fn resource_type(&self) -> Option<&str> {
        let type_schema = self.property("type")?;
        if let Some(constant) = type_schema.get("const").and_then(Value::as_str) {
            return Some(constant);
        }
        type_schema
            .get("enum")
            .and_then(Value::as_array)
            .and_then(|values| values.first())
            .and_then(Value::as_str)
    }

    /// Candidate API versions from `properties.apiVersion.enum`, or the single
    /// `properties.apiVersion.const` when no enumeration exists.
    pub fn api_version_candidates(&self) -> Vec<String> {
        let Some(api_version) = self.property("apiVersion") else {
            return Vec::new();
        };
        if let Some(values) = api_version.get("enum").and_then(Value::as_array) {
            return values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
        api_version
            .get("const")
            .and_then(Value::as_str)
            .map(|v| vec![v.to_string()])
            .unwrap_or_default()
    }

    /// Replace the enumerated API versions. Only applies when the schema
    /// already declares an `apiVersion` property object.
    pub fn set_api_versions(&mut self, versions: Vec<String>) -> bool {
        let Some(api_version) = self
            .0
            .get_mut("properties")
            .and_then(|p| p.get_mut("apiVersion"))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };
        api_version.remove("const");
        api_version.insert(
            "enum".to_string(),
            Value::Array(versions.into_iter().map(Value::String).collect()),
        );
        true
    }

    /// Build a schema view of a single template resource entry so the
    /// generator can treat both input paths alike.
    pub fn from_template_entry(entry: &Value) -> Self {
        let resource_type = entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(NESTED_DEPLOYMENT_TYPE);

        let mut properties = Map::new();
        properties.insert("type".to_string(), json!({ "type": "string", "const": resource_type }));
        if let Some(version) = entry.get("apiVersion").and_then(Value::as_str) {
            properties.insert(
                "apiVersion".to_string(),
                json!({ "type": "string", "enum": [version] }),
            );
        }
        properties.insert("name".to_string(), json!({ "type": "string" }));

        Self(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "title": resource_type,
            "properties": Value::Object(properties),
        }))
    }
}

/// A full deployable unit with parameters, variables, resources and outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTemplate(Value);

impl DeploymentTemplate {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a deployment template from JSON text.
    pub fn parse(text: &str) -> CoreResult<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn schema_uri(&self) -> Option<&str> {
        non_empty_str(self.0.get("$schema"))
    }

    /// Whether the `$schema` URI points at a deployment-template schema.
    pub fn references_deployment_template(&self) -> bool {
        self.schema_uri()
            .map(|uri| uri.contains(DEPLOYMENT_TEMPLATE_MARKER))
            .unwrap_or(false)
    }

    pub fn content_version(&self) -> Option<&str> {
        non_empty_str(self.0.get("contentVersion"))
    }

    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.0.get("parameters").and_then(Value::as_object)
    }

    pub fn variables(&self) -> Option<&Map<String, Value>> {
        self.0.get("variables").and_then(Value::as_object)
    }

    pub fn outputs(&self) -> Option<&Map<String, Value>> {
        self.0.get("outputs").and_then(Value::as_object)
    }

    /// The `resources` sequence; `None` when missing or not an array.
    pub fn resources(&self) -> Option<&Vec<Value>> {
        self.0.get("resources").and_then(Value::as_array)
    }

    pub fn has_resources_field(&self) -> bool {
        self.0.get("resources").is_some()
    }
}

/// Heuristic dialect sniffing: a document is a template when it carries both
/// `$schema` and `resources`.
pub fn is_template(doc: &Value) -> bool {
    doc.get("$schema").is_some() && doc.get("resources").is_some()
}

/// The dialect an input was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    ResourceSchema,
    Template,
    Bicep,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::ResourceSchema => "JSON Schema",
            Dialect::Template => "ARM Template",
            Dialect::Bicep => "Bicep",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User input after the single classification step at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    ResourceSchema(ResourceSchema),
    Template(DeploymentTemplate),
    Bicep(String),
}

impl Input {
    /// Classify raw user text.
    ///
    /// Text that opens like JSON must parse as JSON; the parser's message is
    /// surfaced on failure. Anything else is taken to be generated code.
    pub fn classify(text: &str) -> CoreResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoreError::UnrecognizedInput("input is empty".to_string()));
        }

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let value: Value = serde_json::from_str(trimmed)?;
            return Self::from_json(value);
        }

        Ok(Input::Bicep(text.to_string()))
    }

    /// Classify an already-parsed JSON document.
    pub fn from_json(value: Value) -> CoreResult<Self> {
        if !value.is_object() {
            return Err(CoreError::UnrecognizedInput(
                "expected a JSON object at the top level".to_string(),
            ));
        }
        if is_template(&value) {
            Ok(Input::Template(DeploymentTemplate::from_value(value)))
        } else {
            Ok(Input::ResourceSchema(ResourceSchema::from_value(value)))
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Input::ResourceSchema(_) => Dialect::ResourceSchema,
            Input::Template(_) => Dialect::Template,
            Input::Bicep(_) => Dialect::Bicep,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_schema() -> ResourceSchema {
        ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": "Microsoft.Storage/storageAccounts" },
                "apiVersion": { "enum": ["2021-04-01", "2022-05-01"] }
            }
        }))
    }

    #[test]
    fn test_resource_type_from_const() {
        let schema = storage_schema();
        assert_eq!(schema.resource_type(), Some("Microsoft.Storage/storageAccounts"));
        assert_eq!(schema.api_version_candidates(), vec!["2021-04-01", "2022-05-01"]);
    }

    #[test]
    fn test_resource_type_from_enum() {
        let schema = ResourceSchema::from_value(json!({
            "properties": { "type": { "enum": ["Microsoft.Web/sites"] } }
        }));
        assert_eq!(schema.resource_type(), Some("Microsoft.Web/sites"));
    }

    #[test]
    fn test_set_api_versions() {
        let mut schema = storage_schema();
        assert!(schema.set_api_versions(vec!["2022-09-01".to_string()]));
        assert_eq!(schema.api_version_candidates(), vec!["2022-09-01"]);

        let mut bare = ResourceSchema::from_value(json!({ "type": "object" }));
        assert!(!bare.set_api_versions(vec!["2022-09-01".to_string()]));
    }

    #[test]
    fn test_classify_template() {
        let input = Input::classify(
            r#"{"$schema": "https://example.com/deploymentTemplate.json#", "resources": []}"#,
        )
        .unwrap();
        assert_eq!(input.dialect(), Dialect::Template);
    }

    #[test]
    fn test_classify_schema_and_bicep() {
        let input = Input::classify(r#"{"type": "object"}"#).unwrap();
        assert_eq!(input.dialect(), Dialect::ResourceSchema);

        let input = Input::classify("param name string\n").unwrap();
        assert_eq!(input.dialect(), Dialect::Bicep);
    }

    #[test]
    fn test_classify_malformed_json() {
        let err = Input::classify(r#"{"type": "object""#).unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_template_entry_schema() {
        let entry = json!({ "type": "Microsoft.Web/sites", "apiVersion": "2022-03-01" });
        let schema = ResourceSchema::from_template_entry(&entry);
        assert_eq!(schema.resource_type(), Some("Microsoft.Web/sites"));
        assert_eq!(schema.api_version_candidates(), vec!["2022-03-01"]);
    }
}
