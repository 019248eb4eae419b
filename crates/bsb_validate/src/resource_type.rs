//! Resource type validation against live metadata or the static registry.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use bsb_core::{
    CachedTypeInfo, CloudMetadataProvider, CoreResult, GenerationContext, ResourceSchema,
    FALLBACK_API_VERSION,
};

use crate::result::ValidationResult;

/// Resource types offered as suggestions for unknown identifiers.
const SUGGESTION_TYPES: [&str; 12] = [
    "Microsoft.Network/virtualNetworks",
    "Microsoft.Storage/storageAccounts",
    "Microsoft.Compute/virtualMachines",
    "Microsoft.Web/sites",
    "Microsoft.Web/serverfarms",
    "Microsoft.KeyVault/vaults",
    "Microsoft.Sql/servers",
    "Microsoft.Network/networkSecurityGroups",
    "Microsoft.Network/publicIPAddresses",
    "Microsoft.Network/loadBalancers",
    "Microsoft.ContainerRegistry/registries",
    "Microsoft.ContainerService/managedClusters",
];

/// Regions offered in scaffolded schemas when no live data is available.
const OFFLINE_LOCATIONS: [&str; 8] = [
    "eastus",
    "eastus2",
    "westus",
    "westus2",
    "centralus",
    "northeurope",
    "westeurope",
    "southeastasia",
];

/// Where resource type information came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSource {
    Offline,
    Live,
}

impl ValidationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationSource::Offline => "offline",
            ValidationSource::Live => "live",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ValidationSource::Offline => "Offline Database",
            ValidationSource::Live => "Azure API",
        }
    }
}

impl fmt::Display for ValidationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of checking a resource type and its API versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeValidation {
    pub resource_type: String,
    pub resource_type_valid: bool,
    /// Known API versions, oldest first.
    pub available_api_versions: Vec<String>,
    pub schema_api_versions: Vec<String>,
    pub source: ValidationSource,
    pub suggestions: Vec<String>,
    pub notes: Vec<String>,
}

impl ResourceTypeValidation {
    /// Schema API versions the source does not know about.
    pub fn invalid_api_versions(&self) -> Vec<&str> {
        self.schema_api_versions
            .iter()
            .filter(|v| !self.available_api_versions.contains(v))
            .map(String::as_str)
            .collect()
    }

    pub fn valid_api_versions(&self) -> Vec<&str> {
        self.schema_api_versions
            .iter()
            .filter(|v| self.available_api_versions.contains(v))
            .map(String::as_str)
            .collect()
    }

    /// Newest known API version.
    pub fn latest_available(&self) -> Option<&str> {
        self.available_api_versions.last().map(String::as_str)
    }

    pub fn is_offline(&self) -> bool {
        self.source == ValidationSource::Offline
    }

    /// Render as a validation result for display.
    pub fn to_validation_result(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.resource_type_valid {
            result.add_info(format!("Resource type \"{}\" exists in Azure", self.resource_type));
        } else {
            result.add_warning(format!("Resource type \"{}\" not found in Azure", self.resource_type));
            for suggestion in &self.suggestions {
                result.add_info(format!("Similar resource type: {}", suggestion));
            }
        }

        let invalid = self.invalid_api_versions();
        if !self.schema_api_versions.is_empty() {
            if invalid.is_empty() {
                result.add_info("All API versions are valid");
            } else {
                result.add_warning(format!("Invalid API versions: {}", invalid.join(", ")));
                let start = self.available_api_versions.len().saturating_sub(3);
                if start < self.available_api_versions.len() {
                    result.add_info(format!(
                        "Latest valid versions: {}",
                        self.available_api_versions[start..].join(", ")
                    ));
                }
            }
        }

        for note in &self.notes {
            result.add_warning(note.clone());
        }

        result.add_info(format!("Source: {}", self.source.description()));
        if self.is_offline() {
            result.add_info("Connect to Azure for live validation");
        }

        result
    }
}

/// Validates resource types, preferring live metadata when available.
pub struct ResourceTypeValidator<'a> {
    ctx: &'a GenerationContext,
}

impl<'a> ResourceTypeValidator<'a> {
    pub fn new(ctx: &'a GenerationContext) -> Self {
        Self { ctx }
    }

    /// Validate against the static registry only.
    pub fn validate_offline(&self, resource_type: &str, schema: &ResourceSchema) -> ResourceTypeValidation {
        let info = self.ctx.registry().lookup(resource_type);
        let resource_type_valid = !info.known_api_versions.is_empty();

        ResourceTypeValidation {
            resource_type: resource_type.to_string(),
            resource_type_valid,
            available_api_versions: info.known_api_versions,
            schema_api_versions: schema.api_version_candidates(),
            source: ValidationSource::Offline,
            suggestions: if resource_type_valid {
                Vec::new()
            } else {
                similar_resource_types(resource_type)
            },
            notes: Vec::new(),
        }
    }

    /// Validate using the live provider when it is present and
    /// authenticated, otherwise offline. Provider failures degrade to the
    /// offline result with a note.
    pub async fn validate(&self, resource_type: &str, schema: &ResourceSchema) -> ResourceTypeValidation {
        let Some(provider) = self.ctx.live_metadata() else {
            debug!("No live metadata provider; validating {} offline", resource_type);
            return self.validate_offline(resource_type, schema);
        };

        match self.live_info(provider, resource_type).await {
            Ok(cached) => ResourceTypeValidation {
                resource_type: resource_type.to_string(),
                resource_type_valid: cached.exists,
                available_api_versions: cached.api_versions,
                schema_api_versions: schema.api_version_candidates(),
                source: ValidationSource::Live,
                suggestions: if cached.exists {
                    Vec::new()
                } else {
                    similar_resource_types(resource_type)
                },
                notes: Vec::new(),
            },
            Err(e) => {
                warn!("Live validation failed for {}, falling back to offline: {}", resource_type, e);
                let mut result = self.validate_offline(resource_type, schema);
                result
                    .notes
                    .push(format!("Live metadata unavailable, used offline data: {}", e));
                result
            }
        }
    }

    async fn live_info(
        &self,
        provider: &dyn CloudMetadataProvider,
        resource_type: &str,
    ) -> CoreResult<CachedTypeInfo> {
        if let Some(cached) = self.ctx.cache().get(resource_type) {
            debug!("Using cached metadata for {}", resource_type);
            return Ok(cached);
        }

        let exists = provider.validate_resource_type(resource_type).await?;
        let mut api_versions = if exists {
            provider.api_versions(resource_type).await?
        } else {
            Vec::new()
        };
        api_versions.sort();

        let info = CachedTypeInfo {
            resource_type: resource_type.to_string(),
            exists,
            api_versions,
            fetched_at: self.ctx.clock().now(),
        };
        self.ctx.cache().insert(info.clone());
        Ok(info)
    }

    /// Build a draft-07 resource schema for a type from live metadata, or
    /// from the registry when offline.
    pub async fn scaffold_schema(&self, resource_type: &str) -> ResourceSchema {
        let (api_versions, locations) = match self.ctx.live_metadata() {
            Some(provider) => {
                let versions = provider.api_versions(resource_type).await;
                let locations = provider.resource_locations(resource_type).await;
                match (versions, locations) {
                    (Ok(versions), Ok(locations)) => (versions, locations),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Live metadata unavailable for {}: {}", resource_type, e);
                        self.offline_scaffold_inputs(resource_type)
                    }
                }
            }
            None => self.offline_scaffold_inputs(resource_type),
        };

        info!("Scaffolding schema for {}", resource_type);
        scaffold_schema(resource_type, &api_versions, &locations)
    }

    fn offline_scaffold_inputs(&self, resource_type: &str) -> (Vec<String>, Vec<String>) {
        let mut versions = self.ctx.registry().lookup(resource_type).known_api_versions;
        if versions.is_empty() {
            versions.push(FALLBACK_API_VERSION.to_string());
        }
        let locations = OFFLINE_LOCATIONS.iter().map(|l| l.to_string()).collect();
        (versions, locations)
    }
}

/// Draft-07 skeleton schema for a resource type.
pub fn scaffold_schema(resource_type: &str, api_versions: &[String], locations: &[String]) -> ResourceSchema {
    let mut properties = Map::new();
    properties.insert(
        "apiVersion".to_string(),
        json!({
            "type": "string",
            "enum": api_versions,
            "description": "The API version for the resource"
        }),
    );
    properties.insert(
        "type".to_string(),
        json!({
            "type": "string",
            "const": resource_type,
            "description": "The resource type"
        }),
    );
    properties.insert(
        "name".to_string(),
        json!({ "type": "string", "description": "The name of the resource" }),
    );
    properties.insert(
        "location".to_string(),
        json!({
            "type": "string",
            "enum": locations,
            "description": "The Azure region for the resource"
        }),
    );
    properties.insert(
        "properties".to_string(),
        json!({ "type": "object", "description": "Resource-specific properties" }),
    );

    ResourceSchema::from_value(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "title": format!("{} Schema", resource_type),
        "description": format!("Auto-generated schema for {}", resource_type),
        "properties": Value::Object(properties),
        "required": ["apiVersion", "type", "name"]
    }))
}

/// Up to three known resource types whose kind segment overlaps the input.
pub fn similar_resource_types(resource_type: &str) -> Vec<String> {
    let input = resource_type.to_lowercase();
    let input_kind = kind_segment(&input);
    if input_kind.is_empty() {
        return Vec::new();
    }

    SUGGESTION_TYPES
        .iter()
        .filter(|candidate| {
            let candidate = candidate.to_lowercase();
            let candidate_kind = kind_segment(&candidate);
            candidate.contains(input_kind) || input.contains(candidate_kind)
        })
        .take(3)
        .map(|t| t.to_string())
        .collect()
}

fn kind_segment(resource_type: &str) -> &str {
    resource_type.split('/').nth(1).unwrap_or(resource_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(resource_type: &str, versions: &[&str]) -> ResourceSchema {
        ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": resource_type },
                "apiVersion": { "enum": versions }
            }
        }))
    }

    #[test]
    fn test_offline_known_type() {
        let ctx = GenerationContext::new();
        let validator = ResourceTypeValidator::new(&ctx);
        let result = validator.validate_offline(
            "Microsoft.Storage/storageAccounts",
            &schema("Microsoft.Storage/storageAccounts", &["2022-05-01", "2019-01-01"]),
        );

        assert!(result.resource_type_valid);
        assert_eq!(result.source, ValidationSource::Offline);
        assert_eq!(result.invalid_api_versions(), vec!["2019-01-01"]);
        assert_eq!(result.latest_available(), Some("2022-09-01"));
    }

    #[test]
    fn test_offline_unknown_type() {
        let ctx = GenerationContext::new();
        let validator = ResourceTypeValidator::new(&ctx);
        let result = validator.validate_offline("Microsoft.Network/virtualNetwork", &schema("x", &[]));

        assert!(!result.resource_type_valid);
        assert!(result.available_api_versions.is_empty());
        assert!(result
            .suggestions
            .contains(&"Microsoft.Network/virtualNetworks".to_string()));
    }

    #[test]
    fn test_similar_types_limit() {
        let suggestions = similar_resource_types("Microsoft.Web/s");
        assert!(suggestions.len() <= 3);
        assert!(similar_resource_types("").is_empty());
    }

    #[test]
    fn test_scaffold_schema_shape() {
        let schema = scaffold_schema(
            "Microsoft.Web/sites",
            &["2022-03-01".to_string()],
            &["eastus".to_string()],
        );
        assert_eq!(schema.resource_type(), Some("Microsoft.Web/sites"));
        assert_eq!(schema.api_version_candidates(), vec!["2022-03-01"]);
        assert_eq!(schema.as_value()["required"], json!(["apiVersion", "type", "name"]));
    }

    #[test]
    fn test_to_validation_result_surfaces_source() {
        let ctx = GenerationContext::new();
        let validator = ResourceTypeValidator::new(&ctx);
        let result = validator
            .validate_offline("Contoso.Widgets/gadgets", &schema("Contoso.Widgets/gadgets", &[]))
            .to_validation_result();

        assert!(result.is_valid());
        assert!(result.info().iter().any(|i| i == "Source: Offline Database"));
        assert!(result.warnings().iter().any(|w| w.contains("not found")));
    }
}
