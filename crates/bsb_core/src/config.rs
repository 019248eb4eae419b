//! Generation configuration.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::registry::TargetScope;

/// Default region used by the template converter.
pub const DEFAULT_LOCATION: &str = "eastus";

/// How the converter provisions networking for a virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NetworkMode {
    #[default]
    CreateNew,
    UseExisting,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::CreateNew => "create-new",
            NetworkMode::UseExisting => "existing",
        }
    }
}

impl From<String> for NetworkMode {
    /// `existing` and `use-existing` select an existing network; any other
    /// value creates a new one.
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "existing" | "use-existing" => NetworkMode::UseExisting,
            _ => NetworkMode::CreateNew,
        }
    }
}

impl From<NetworkMode> for String {
    fn from(mode: NetworkMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operating system of a generated virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OsType {
    #[default]
    Windows,
    Linux,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "Windows",
            OsType::Linux => "Linux",
        }
    }
}

impl FromStr for OsType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" => Ok(OsType::Windows),
            "linux" => Ok(OsType::Linux),
            other => Err(CoreError::InvalidConfiguration(format!(
                "unknown OS type '{}' (expected Windows or Linux)",
                other
            ))),
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-supplied generation options.
///
/// Every key is optional in files; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    /// Target region. `None` defers to the resource group's location.
    pub location: Option<String>,
    pub target_scope: TargetScope,
    pub environment: String,
    pub resource_prefix: String,

    pub network_mode: NetworkMode,
    pub vnet_address_space: String,
    pub subnet_address_space: String,
    pub existing_vnet_name: Option<String>,
    pub existing_subnet_name: Option<String>,
    pub existing_vnet_resource_group: Option<String>,

    pub vm_size: String,
    pub os_type: OsType,
    pub admin_username: String,

    pub include_parameters: bool,
    pub include_dependencies: bool,
    pub include_outputs: bool,
    pub generate_modules: bool,
    #[serde(rename = "includeNSG")]
    pub include_nsg: bool,
    pub include_boot_diagnostics: bool,
    #[serde(rename = "includePublicIP")]
    pub include_public_ip: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            location: None,
            target_scope: TargetScope::ResourceGroup,
            environment: "dev".to_string(),
            resource_prefix: "bicep".to_string(),
            network_mode: NetworkMode::CreateNew,
            vnet_address_space: "10.0.0.0/16".to_string(),
            subnet_address_space: "10.0.1.0/24".to_string(),
            existing_vnet_name: None,
            existing_subnet_name: None,
            existing_vnet_resource_group: None,
            vm_size: "Standard_B2s".to_string(),
            os_type: OsType::Windows,
            admin_username: "azureuser".to_string(),
            include_parameters: true,
            include_dependencies: true,
            include_outputs: true,
            generate_modules: false,
            include_nsg: true,
            include_boot_diagnostics: true,
            include_public_ip: true,
        }
    }
}

impl Configuration {
    /// Load configuration from a YAML or JSON file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from YAML or JSON text.
    pub fn from_str(content: &str) -> CoreResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save configuration as YAML.
    pub fn to_file(&self, path: &Path) -> CoreResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_network_mode(mut self, mode: NetworkMode) -> Self {
        self.network_mode = mode;
        self
    }

    pub fn with_existing_network(
        mut self,
        vnet_name: impl Into<String>,
        subnet_name: impl Into<String>,
    ) -> Self {
        self.network_mode = NetworkMode::UseExisting;
        self.existing_vnet_name = Some(vnet_name.into());
        self.existing_subnet_name = Some(subnet_name.into());
        self
    }

    pub fn with_os_type(mut self, os_type: OsType) -> Self {
        self.os_type = os_type;
        self
    }

    pub fn with_modules(mut self, enabled: bool) -> Self {
        self.generate_modules = enabled;
        self
    }

    /// Location for the converter, which always needs a concrete region.
    pub fn conversion_location(&self) -> &str {
        self.location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LOCATION)
    }

    /// Check the options the template converter depends on.
    ///
    /// Existing-network mode needs both the network and subnet names; all
    /// missing fields are reported together.
    pub fn validate_for_conversion(&self) -> CoreResult<()> {
        if self.network_mode != NetworkMode::UseExisting {
            return Ok(());
        }

        let mut missing = Vec::new();
        if is_blank(&self.existing_vnet_name) || is_blank(&self.existing_subnet_name) {
            missing.push("existingVnetName".to_string());
            missing.push("existingSubnetName".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingConfiguration { fields: missing })
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_network_mode_parsing() {
        assert_eq!(NetworkMode::from("existing".to_string()), NetworkMode::UseExisting);
        assert_eq!(NetworkMode::from("use-existing".to_string()), NetworkMode::UseExisting);
        assert_eq!(NetworkMode::from("create-new".to_string()), NetworkMode::CreateNew);
        assert_eq!(NetworkMode::from("anything".to_string()), NetworkMode::CreateNew);
    }

    #[test]
    fn test_os_type_parsing() {
        assert_eq!("linux".parse::<OsType>().unwrap(), OsType::Linux);
        assert_eq!("Windows".parse::<OsType>().unwrap(), OsType::Windows);
        assert!(matches!(
            "solaris".parse::<OsType>(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_config_from_yaml() {
        let config = Configuration::from_str(
            "networkMode: existing\nexistingVnetName: hub\nincludeNSG: false\nosType: Linux\n",
        )
        .unwrap();

        assert_eq!(config.network_mode, NetworkMode::UseExisting);
        assert_eq!(config.existing_vnet_name.as_deref(), Some("hub"));
        assert!(!config.include_nsg);
        assert_eq!(config.os_type, OsType::Linux);
        assert!(config.include_public_ip);
    }

    #[test]
    fn test_config_from_json() {
        let config = Configuration::from_str(r#"{"generateModules": true, "location": "westeurope"}"#)
            .unwrap();
        assert!(config.generate_modules);
        assert_eq!(config.location.as_deref(), Some("westeurope"));
    }

    #[test]
    fn test_existing_network_requires_names() {
        let config = Configuration::default()
            .with_network_mode(NetworkMode::UseExisting);
        let err = config.validate_for_conversion().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("existingVnetName"));
        assert!(message.contains("existingSubnetName"));

        let config = Configuration::default().with_existing_network("hub", "");
        assert!(config.validate_for_conversion().is_err());

        let config = Configuration::default().with_existing_network("hub", "apps");
        assert!(config.validate_for_conversion().is_ok());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bsb.yaml");
        let config = Configuration::default().with_location("westus2").with_modules(true);

        config.to_file(&path).unwrap();
        let loaded = Configuration::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
