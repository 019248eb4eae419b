//! Deployment template analysis ahead of conversion.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use bsb_core::{DeploymentTemplate, NETWORK_INTERFACE_TYPE, VIRTUAL_MACHINE_TYPE, VIRTUAL_NETWORK_TYPE};

/// VM name used when the template does not name it through a parameter.
pub const DEFAULT_VM_NAME: &str = "myvm";

pub const NETWORK_SECURITY_GROUP_TYPE: &str = "Microsoft.Network/networkSecurityGroups";
pub const PUBLIC_IP_ADDRESS_TYPE: &str = "Microsoft.Network/publicIPAddresses";
pub const MANAGED_DISK_TYPE: &str = "Microsoft.Compute/disks";

const PARAMETER_REFERENCE_MARKER: &str = "parameters(";

fn parameter_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"parameters\('([^']+)'\)").expect("parameter pattern is valid"))
}

/// A resource the converted document will have to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDependency {
    pub resource_type: String,
    pub reason: String,
    /// The template already declares a resource of this type. The
    /// dependency is still listed; conversion decides what to synthesize.
    pub present_in_template: bool,
}

/// Result of analyzing a deployment template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub resources: Vec<Value>,
    pub parameter_names: Vec<String>,
    pub variable_names: Vec<String>,
    /// Distinct resource types in first-seen order.
    pub resource_types: Vec<String>,
    pub missing_dependencies: Vec<MissingDependency>,
    /// Name for the converted virtual machine.
    pub vm_name: String,
}

impl Analysis {
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn contains_type(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|t| t == resource_type)
    }

    pub fn virtual_machines(&self) -> impl Iterator<Item = &Value> {
        self.resources
            .iter()
            .filter(|r| resource_type_of(r) == Some(VIRTUAL_MACHINE_TYPE))
    }

    /// Human-readable summary lines.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Resources: {}", self.resources.len()),
            format!("Parameters: {}", self.parameter_names.len()),
            format!("Variables: {}", self.variable_names.len()),
        ];
        if !self.resource_types.is_empty() {
            lines.push(format!("Resource types: {}", self.resource_types.join(", ")));
        }
        for dependency in &self.missing_dependencies {
            let mut line = format!("Missing dependency: {} ({})", dependency.resource_type, dependency.reason);
            if dependency.present_in_template {
                line.push_str(" [already in template]");
            }
            lines.push(line);
        }
        lines
    }
}

/// Inspects deployment templates.
pub struct TemplateAnalyzer;

impl TemplateAnalyzer {
    pub fn analyze(template: &DeploymentTemplate) -> Analysis {
        let resources = template.resources().cloned().unwrap_or_default();
        let parameter_names = template
            .parameters()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        let variable_names = template
            .variables()
            .map(|v| v.keys().cloned().collect())
            .unwrap_or_default();

        let mut resource_types: Vec<String> = Vec::new();
        for resource in &resources {
            if let Some(resource_type) = resource_type_of(resource) {
                if !resource_types.iter().any(|t| t == resource_type) {
                    resource_types.push(resource_type.to_string());
                }
            }
        }

        let mut analysis = Analysis {
            resources,
            parameter_names,
            variable_names,
            resource_types,
            missing_dependencies: Vec::new(),
            vm_name: DEFAULT_VM_NAME.to_string(),
        };

        let mut missing = Vec::new();
        let mut vm_name = None;
        for vm in analysis.virtual_machines() {
            if vm_name.is_none() {
                vm_name = Some(extract_parameter_name(vm.get("name")));
            }
            missing.extend(vm_dependencies(vm, &analysis));
        }
        analysis.missing_dependencies = missing;
        if let Some(name) = vm_name {
            analysis.vm_name = name;
        }

        info!(
            "Analyzed template: {} resources, {} missing dependencies",
            analysis.resources.len(),
            analysis.missing_dependencies.len()
        );
        analysis
    }
}

fn resource_type_of(resource: &Value) -> Option<&str> {
    resource.get("type").and_then(Value::as_str)
}

fn is_parameter_reference(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map(|s| s.contains(PARAMETER_REFERENCE_MARKER))
        .unwrap_or(false)
}

/// Dependencies of one virtual machine: external references in its network
/// and disk profiles, followed by the network baseline. The baseline is
/// listed even when the template declares those resources.
fn vm_dependencies(vm: &Value, analysis: &Analysis) -> Vec<MissingDependency> {
    let dependency = |resource_type: &str, reason: &str| {
        let present_in_template = analysis.contains_type(resource_type);
        if present_in_template {
            debug!("{} is already declared in the template", resource_type);
        }
        MissingDependency {
            resource_type: resource_type.to_string(),
            reason: reason.to_string(),
            present_in_template,
        }
    };

    let mut dependencies = Vec::new();
    let properties = vm.get("properties");

    let interfaces = properties
        .and_then(|p| p.pointer("/networkProfile/networkInterfaces"))
        .and_then(Value::as_array);
    for interface in interfaces.into_iter().flatten() {
        if is_parameter_reference(interface.get("id")) {
            dependencies.push(dependency(
                NETWORK_INTERFACE_TYPE,
                "External reference - will create new NIC with subnet",
            ));
        }
    }

    let disk_id = properties.and_then(|p| p.pointer("/storageProfile/osDisk/managedDisk/id"));
    if is_parameter_reference(disk_id) {
        dependencies.push(dependency(
            MANAGED_DISK_TYPE,
            "External reference - will create new managed disk",
        ));
    }

    dependencies.push(dependency(VIRTUAL_NETWORK_TYPE, "Required for VM deployment"));
    dependencies.push(dependency(NETWORK_SECURITY_GROUP_TYPE, "Security best practice"));
    dependencies.push(dependency(PUBLIC_IP_ADDRESS_TYPE, "Optional - for external access"));
    dependencies
}

/// Name referenced by `parameters('x')` in a template expression, without
/// a trailing `_name`. Anything else yields [`DEFAULT_VM_NAME`].
pub fn extract_parameter_name(expression: Option<&Value>) -> String {
    expression
        .and_then(Value::as_str)
        .and_then(|s| parameter_reference().captures(s))
        .and_then(|captures| captures.get(1))
        .map(|m| {
            let name = m.as_str();
            name.strip_suffix("_name").unwrap_or(name).to_string()
        })
        .unwrap_or_else(|| DEFAULT_VM_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vm_template() -> DeploymentTemplate {
        DeploymentTemplate::from_value(json!({
            "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
            "contentVersion": "1.0.0.0",
            "parameters": { "virtualMachines_web01_name": { "type": "string" } },
            "resources": [
                {
                    "type": "Microsoft.Network/virtualNetworks",
                    "apiVersion": "2022-01-01",
                    "name": "vnet"
                },
                {
                    "type": "Microsoft.Compute/virtualMachines",
                    "apiVersion": "2022-08-01",
                    "name": "[parameters('virtualMachines_web01_name')]",
                    "properties": {
                        "networkProfile": {
                            "networkInterfaces": [
                                { "id": "[parameters('networkInterfaces_web01_externalid')]" }
                            ]
                        },
                        "storageProfile": {
                            "osDisk": { "managedDisk": { "id": "[parameters('disks_web01_externalid')]" } }
                        }
                    }
                }
            ]
        }))
    }

    #[test]
    fn test_extract_parameter_name() {
        assert_eq!(
            extract_parameter_name(Some(&json!("[parameters('virtualMachines_web01_name')]"))),
            "virtualMachines_web01"
        );
        assert_eq!(extract_parameter_name(Some(&json!("[parameters('vm')]"))), "vm");
        assert_eq!(extract_parameter_name(Some(&json!("literal-name"))), DEFAULT_VM_NAME);
        assert_eq!(extract_parameter_name(None), DEFAULT_VM_NAME);
    }

    #[test]
    fn test_vm_dependencies() {
        let analysis = TemplateAnalyzer::analyze(&vm_template());

        assert_eq!(analysis.resource_count(), 2);
        assert_eq!(analysis.vm_name, "virtualMachines_web01");
        assert_eq!(analysis.parameter_names, vec!["virtualMachines_web01_name"]);

        let types: Vec<_> = analysis
            .missing_dependencies
            .iter()
            .map(|d| d.resource_type.as_str())
            .collect();
        assert_eq!(
            types,
            vec![
                NETWORK_INTERFACE_TYPE,
                MANAGED_DISK_TYPE,
                VIRTUAL_NETWORK_TYPE,
                NETWORK_SECURITY_GROUP_TYPE,
                PUBLIC_IP_ADDRESS_TYPE,
            ]
        );

        let vnet = &analysis.missing_dependencies[2];
        assert!(vnet.present_in_template);
        assert!(!analysis.missing_dependencies[3].present_in_template);
    }

    #[test]
    fn test_template_without_vm() {
        let template = DeploymentTemplate::from_value(json!({
            "resources": [
                { "type": "Microsoft.Storage/storageAccounts" },
                { "type": "Microsoft.Storage/storageAccounts" }
            ]
        }));
        let analysis = TemplateAnalyzer::analyze(&template);
        assert_eq!(analysis.resource_types, vec!["Microsoft.Storage/storageAccounts"]);
        assert!(analysis.missing_dependencies.is_empty());
        assert_eq!(analysis.vm_name, DEFAULT_VM_NAME);
    }

    #[test]
    fn test_template_without_resources() {
        let analysis = TemplateAnalyzer::analyze(&DeploymentTemplate::from_value(json!({})));
        assert_eq!(analysis.resource_count(), 0);
        assert!(analysis.summary()[0].contains("Resources: 0"));
    }
}
