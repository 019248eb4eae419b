//! Resource type registry.
//!
//! Maps resource type identifiers to the flags that drive code generation.
//! The registry is read-only after construction; lookups for unknown types
//! return a generic entry instead of failing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{ResourceSchema, NESTED_DEPLOYMENT_TYPE};

/// API version used when neither the registry nor the schema offers one.
pub const FALLBACK_API_VERSION: &str = "2022-01-01";

/// Marker identifying a preview API version.
const PREVIEW_MARKER: &str = "preview";

pub const VIRTUAL_NETWORK_TYPE: &str = "Microsoft.Network/virtualNetworks";
pub const STORAGE_ACCOUNT_TYPE: &str = "Microsoft.Storage/storageAccounts";
pub const WEB_SITE_TYPE: &str = "Microsoft.Web/sites";
pub const VIRTUAL_MACHINE_TYPE: &str = "Microsoft.Compute/virtualMachines";
pub const NETWORK_INTERFACE_TYPE: &str = "Microsoft.Network/networkInterfaces";

/// Deployment scope of the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetScope {
    #[default]
    ResourceGroup,
    Subscription,
    ManagementGroup,
    Tenant,
}

impl TargetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetScope::ResourceGroup => "resourceGroup",
            TargetScope::Subscription => "subscription",
            TargetScope::ManagementGroup => "managementGroup",
            TargetScope::Tenant => "tenant",
        }
    }
}

impl fmt::Display for TargetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which generation tables apply to a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    VirtualNetwork,
    StorageAccount,
    WebSite,
    VirtualMachine,
    NestedDeployment,
    Generic,
}

impl ResourceKind {
    /// Whether the generator has a type-specific parameter table.
    pub fn has_specific_tables(&self) -> bool {
        matches!(
            self,
            ResourceKind::VirtualNetwork
                | ResourceKind::StorageAccount
                | ResourceKind::WebSite
                | ResourceKind::VirtualMachine
        )
    }
}

/// Generation behaviour for one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeInfo {
    pub resource_type: String,
    pub kind: ResourceKind,
    pub supports_location_and_tags: bool,
    pub preferred_api_version: Option<String>,
    /// API versions known to exist, oldest first.
    pub known_api_versions: Vec<String>,
    /// Resource types that must be synthesized alongside this one.
    pub auxiliary_resources: Vec<String>,
    /// Whether this entry came from the registry table.
    pub registered: bool,
}

impl ResourceTypeInfo {
    /// Default entry for types the registry does not know.
    pub fn generic(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            kind: ResourceKind::Generic,
            supports_location_and_tags: true,
            preferred_api_version: None,
            known_api_versions: Vec::new(),
            auxiliary_resources: Vec::new(),
            registered: false,
        }
    }

    fn entry(resource_type: &str, kind: ResourceKind) -> Self {
        Self {
            kind,
            registered: true,
            ..Self::generic(resource_type)
        }
    }

    fn preferred(mut self, version: &str) -> Self {
        self.preferred_api_version = Some(version.to_string());
        self
    }

    fn versions(mut self, versions: &[&str]) -> Self {
        self.known_api_versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    fn auxiliary(mut self, resource_type: &str) -> Self {
        self.auxiliary_resources.push(resource_type.to_string());
        self
    }

    fn without_location(mut self) -> Self {
        self.supports_location_and_tags = false;
        self
    }

    /// Newest API version the registry knows for this type.
    pub fn latest_known_api_version(&self) -> Option<&str> {
        self.known_api_versions.last().map(String::as_str)
    }
}

/// Registry of resource type generation behaviour.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeRegistry {
    entries: HashMap<String, ResourceTypeInfo>,
}

impl ResourceTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry populated with the built-in Azure resource types.
    pub fn azure() -> Self {
        let mut registry = Self::new();

        registry.register(
            ResourceTypeInfo::entry(VIRTUAL_NETWORK_TYPE, ResourceKind::VirtualNetwork)
                .preferred("2022-01-01")
                .versions(&[
                    "2020-11-01", "2021-02-01", "2021-05-01", "2021-08-01", "2022-01-01",
                    "2022-05-01", "2022-07-01", "2022-09-01",
                ]),
        );
        registry.register(
            ResourceTypeInfo::entry(STORAGE_ACCOUNT_TYPE, ResourceKind::StorageAccount)
                .preferred("2022-05-01")
                .versions(&[
                    "2021-04-01", "2021-06-01", "2021-08-01", "2021-09-01", "2022-05-01",
                    "2022-09-01",
                ]),
        );
        registry.register(
            ResourceTypeInfo::entry(VIRTUAL_MACHINE_TYPE, ResourceKind::VirtualMachine)
                .preferred("2022-08-01")
                .versions(&[
                    "2021-03-01", "2021-07-01", "2021-11-01", "2022-03-01", "2022-08-01",
                    "2022-11-01",
                ])
                .auxiliary(NETWORK_INTERFACE_TYPE),
        );
        registry.register(
            ResourceTypeInfo::entry(WEB_SITE_TYPE, ResourceKind::WebSite)
                .preferred("2022-03-01")
                .versions(&["2021-02-01", "2021-03-01", "2022-03-01", "2022-09-01"]),
        );
        registry.register(
            ResourceTypeInfo::entry("Microsoft.Web/serverfarms", ResourceKind::Generic)
                .preferred("2022-03-01")
                .versions(&["2021-02-01", "2021-03-01", "2022-03-01", "2022-09-01"]),
        );
        registry.register(
            ResourceTypeInfo::entry("Microsoft.KeyVault/vaults", ResourceKind::Generic)
                .preferred("2022-07-01")
                .versions(&["2021-10-01", "2022-07-01", "2023-02-01"]),
        );
        registry.register(
            ResourceTypeInfo::entry("Microsoft.Sql/servers", ResourceKind::Generic)
                .preferred("2022-05-01-preview")
                .versions(&["2021-11-01", "2022-05-01-preview", "2022-08-01-preview"]),
        );
        registry.register(
            ResourceTypeInfo::entry("Microsoft.Insights/components", ResourceKind::Generic)
                .versions(&["2020-02-02"]),
        );
        registry.register(
            ResourceTypeInfo::entry(NETWORK_INTERFACE_TYPE, ResourceKind::Generic)
                .preferred("2022-07-01")
                .versions(&["2022-07-01"]),
        );

        // Nested deployments carry a location everywhere except at
        // resource-group scope; see `lookup_scoped`.
        registry.register(ResourceTypeInfo::entry(
            NESTED_DEPLOYMENT_TYPE,
            ResourceKind::NestedDeployment,
        ));
        registry.register(
            ResourceTypeInfo::entry("Microsoft.Authorization/policyAssignments", ResourceKind::Generic)
                .without_location(),
        );
        registry.register(
            ResourceTypeInfo::entry("Microsoft.Authorization/roleAssignments", ResourceKind::Generic)
                .without_location(),
        );

        registry
    }

    /// Register a resource type. Replaces any existing entry.
    pub fn register(&mut self, info: ResourceTypeInfo) {
        debug!("Registering resource type: {}", info.resource_type);
        self.entries.insert(info.resource_type.clone(), info);
    }

    /// Look up a resource type at resource-group scope.
    pub fn lookup(&self, resource_type: &str) -> ResourceTypeInfo {
        self.lookup_scoped(resource_type, TargetScope::ResourceGroup)
    }

    /// Look up a resource type for a given deployment scope.
    pub fn lookup_scoped(&self, resource_type: &str, scope: TargetScope) -> ResourceTypeInfo {
        let mut info = self
            .entries
            .get(resource_type)
            .cloned()
            .unwrap_or_else(|| ResourceTypeInfo::generic(resource_type));

        if info.kind == ResourceKind::NestedDeployment && scope == TargetScope::ResourceGroup {
            info.supports_location_and_tags = false;
        }

        info
    }

    /// Check if a resource type is registered.
    pub fn contains(&self, resource_type: &str) -> bool {
        self.entries.contains_key(resource_type)
    }

    /// All registered resource type identifiers, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.entries.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Choose the API version to emit for a resource.
    ///
    /// Preference order: the registry's known-good version, the newest
    /// non-preview schema candidate, the newest candidate, then
    /// [`FALLBACK_API_VERSION`]. Versions are `YYYY-MM-DD[-preview]`, so
    /// lexicographic order is chronological.
    pub fn select_api_version(&self, schema: &ResourceSchema, resource_type: &str) -> String {
        if let Some(version) = self
            .entries
            .get(resource_type)
            .and_then(|info| info.preferred_api_version.as_ref())
        {
            return version.clone();
        }

        let candidates = schema.api_version_candidates();
        let newest_stable = candidates
            .iter()
            .filter(|v| !v.contains(PREVIEW_MARKER))
            .max();

        newest_stable
            .or_else(|| candidates.iter().max())
            .cloned()
            .unwrap_or_else(|| FALLBACK_API_VERSION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_with_versions(resource_type: &str, versions: &[&str]) -> ResourceSchema {
        ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": resource_type },
                "apiVersion": { "enum": versions }
            }
        }))
    }

    #[test]
    fn test_unknown_type_falls_back_to_generic() {
        let registry = ResourceTypeRegistry::azure();
        let info = registry.lookup("Contoso.Widgets/gadgets");

        assert_eq!(info.kind, ResourceKind::Generic);
        assert!(info.supports_location_and_tags);
        assert!(info.auxiliary_resources.is_empty());
        assert!(!info.registered);
    }

    #[test]
    fn test_location_exceptions() {
        let registry = ResourceTypeRegistry::azure();

        assert!(!registry.lookup(NESTED_DEPLOYMENT_TYPE).supports_location_and_tags);
        assert!(
            registry
                .lookup_scoped(NESTED_DEPLOYMENT_TYPE, TargetScope::Subscription)
                .supports_location_and_tags
        );
        assert!(!registry.lookup("Microsoft.Authorization/roleAssignments").supports_location_and_tags);
        assert!(!registry.lookup("Microsoft.Authorization/policyAssignments").supports_location_and_tags);
        assert!(registry.lookup(STORAGE_ACCOUNT_TYPE).supports_location_and_tags);
    }

    #[test]
    fn test_vm_requires_network_interface() {
        let registry = ResourceTypeRegistry::azure();
        let info = registry.lookup(VIRTUAL_MACHINE_TYPE);
        assert_eq!(info.auxiliary_resources, vec![NETWORK_INTERFACE_TYPE.to_string()]);
    }

    #[test]
    fn test_select_api_version_prefers_registry() {
        let registry = ResourceTypeRegistry::azure();
        let schema = schema_with_versions(STORAGE_ACCOUNT_TYPE, &["2021-04-01", "2022-05-01"]);
        assert_eq!(registry.select_api_version(&schema, STORAGE_ACCOUNT_TYPE), "2022-05-01");
    }

    #[test]
    fn test_select_api_version_newest_stable() {
        let registry = ResourceTypeRegistry::new();
        let schema = schema_with_versions(
            "Contoso.Widgets/gadgets",
            &["2023-01-01", "2021-04-01", "2024-01-01-preview"],
        );
        assert_eq!(registry.select_api_version(&schema, "Contoso.Widgets/gadgets"), "2023-01-01");
    }

    #[test]
    fn test_select_api_version_all_preview() {
        let registry = ResourceTypeRegistry::new();
        let schema = schema_with_versions("X.Y/z", &["2021-01-01-preview", "2022-01-01-preview"]);
        assert_eq!(registry.select_api_version(&schema, "X.Y/z"), "2022-01-01-preview");
    }

    #[test]
    fn test_select_api_version_fallback() {
        let registry = ResourceTypeRegistry::new();
        let schema = ResourceSchema::from_value(json!({ "type": "object" }));
        assert_eq!(registry.select_api_version(&schema, "X.Y/z"), FALLBACK_API_VERSION);
    }

    #[test]
    fn test_select_api_version_is_idempotent() {
        let registry = ResourceTypeRegistry::azure();
        let schema = schema_with_versions("X.Y/z", &["2020-01-01", "2021-01-01"]);
        let first = registry.select_api_version(&schema, "X.Y/z");
        let second = registry.select_api_version(&schema, "X.Y/z");
        assert_eq!(first, second);
    }
}
