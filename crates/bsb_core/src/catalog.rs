//! Catalog of resources selectable in the deployment builder.

use serde::{Deserialize, Serialize};

/// One selectable resource: a short id, a display name and the schema file
/// that describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedResource {
    pub id: String,
    pub name: String,
    pub schema: String,
}

impl SelectedResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: schema.into(),
        }
    }
}

/// Built-in resource catalog.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    entries: Vec<SelectedResource>,
}

impl ResourceCatalog {
    pub fn builtin() -> Self {
        let entries = [
            ("storage", "Storage Account", "storage-account"),
            ("webapp", "Web App", "web-app"),
            ("vm", "Virtual Machine", "virtual-machine"),
            ("keyvault", "Key Vault", "key-vault"),
            ("sqldatabase", "SQL Database", "sql-database"),
            ("functions", "Function App", "function-app"),
            ("appplan", "App Service Plan", "app-service-plan"),
            ("vnet", "Virtual Network", "virtual-network"),
        ]
        .into_iter()
        .map(|(id, name, schema)| SelectedResource::new(id, name, schema))
        .collect();

        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&SelectedResource> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn entries(&self) -> &[SelectedResource] {
        &self.entries
    }
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ResourceCatalog::builtin();
        assert_eq!(catalog.entries().len(), 8);
        assert_eq!(catalog.get("vm").unwrap().schema, "virtual-machine");
        assert!(catalog.get("mainframe").is_none());
    }
}
