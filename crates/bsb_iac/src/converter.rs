//! ARM template to Bicep conversion for virtual machine deployments.
//!
//! Conversion is a two-step session: [`ArmConverter::analyze`] inspects the
//! template, then [`ArmConverter::convert`] emits a standalone document that
//! either creates the VM's network or binds to an existing one.

use tracing::{debug, info};

use bsb_core::{
    Configuration, DeploymentTemplate, GenerationContext, NetworkMode, OsType, TargetScope,
    NETWORK_INTERFACE_TYPE, VIRTUAL_MACHINE_TYPE, VIRTUAL_NETWORK_TYPE,
};

use crate::analyzer::{Analysis, TemplateAnalyzer, NETWORK_SECURITY_GROUP_TYPE, PUBLIC_IP_ADDRESS_TYPE};
use crate::bicep::{
    BicepType, BicepValue, Body, DocumentBuilder, GeneratedDocument, Output, Param, ResourceDecl,
    Variable,
};
use crate::error::{IacError, IacResult};
use crate::rules::{self, GENERATOR_NAME};

/// API version for every network resource the converter emits.
pub const NETWORK_API_VERSION: &str = "2023-05-01";
/// API version for the converted virtual machine.
pub const COMPUTE_API_VERSION: &str = "2024-11-01";

const SUBNET_TYPE: &str = "Microsoft.Network/virtualNetworks/subnets";
const PRIVATE_IP: &str = "networkInterface.properties.ipConfigurations[0].properties.privateIPAddress";
const PUBLIC_FQDN: &str = "publicIPAddress.properties.dnsSettings.fqdn";

/// Converts an analyzed deployment template into a Bicep document.
pub struct ArmConverter<'a> {
    ctx: &'a GenerationContext,
    config: &'a Configuration,
    analysis: Option<Analysis>,
}

impl<'a> ArmConverter<'a> {
    pub fn new(ctx: &'a GenerationContext, config: &'a Configuration) -> Self {
        Self {
            ctx,
            config,
            analysis: None,
        }
    }

    /// Analyze the template and keep the result for [`convert`](Self::convert).
    pub fn analyze(&mut self, template: &DeploymentTemplate) -> &Analysis {
        self.analysis.insert(TemplateAnalyzer::analyze(template))
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    /// Convert the analyzed template.
    ///
    /// Fails with [`IacError::NotAnalyzed`] before [`analyze`](Self::analyze)
    /// has run, and with a missing-configuration error when existing-network
    /// mode lacks the network or subnet name. Nothing is generated in either
    /// case.
    pub fn convert(&self) -> IacResult<GeneratedDocument> {
        let analysis = self.analysis.as_ref().ok_or(IacError::NotAnalyzed)?;
        self.convert_analysis(analysis)
    }

    /// Convert using an analysis produced elsewhere.
    pub fn convert_analysis(&self, analysis: &Analysis) -> IacResult<GeneratedDocument> {
        self.config.validate_for_conversion()?;

        let plan = ConversionPlan::new(self.config, &analysis.vm_name);
        info!(
            "Converting template for VM '{}' ({} network)",
            plan.vm_name,
            self.config.network_mode.as_str()
        );
        for dependency in &analysis.missing_dependencies {
            debug!("Dependency {}: {}", dependency.resource_type, dependency.reason);
        }

        let builder = self.header(&plan);
        let builder = plan.parameters(builder);
        let builder = plan.variables(builder);
        let builder = plan.resources(builder);
        Ok(plan.outputs(builder).build())
    }

    fn header(&self, plan: &ConversionPlan<'_>) -> DocumentBuilder {
        let timestamp = self.ctx.clock().timestamp();
        let builder = GeneratedDocument::builder(TargetScope::ResourceGroup);
        let builder = if plan.existing {
            builder
                .header_line("VM Deployment using Existing VNet/Subnet - Converted from ARM Template")
                .header_line(format!("Generated on: {}", timestamp))
                .header_line("Uses existing network infrastructure")
                .header_line(format!("VM Name: {}", plan.vm_name))
                .metadata("description", "VM deployment using existing VNet and subnet")
        } else {
            builder
                .header_line("Complete VM Deployment - Converted from ARM Template")
                .header_line(format!("Generated on: {}", timestamp))
                .header_line("Includes all dependencies for standalone deployment")
                .metadata("description", "Complete VM deployment with all dependencies")
        };
        builder
            .metadata("author", format!("{} - ARM Converter", GENERATOR_NAME))
            .metadata("version", "1.0.0")
    }
}

/// Decisions derived from the configuration for one conversion.
struct ConversionPlan<'c> {
    config: &'c Configuration,
    vm_name: String,
    existing: bool,
    linux: bool,
    vnet_resource_group: Option<String>,
}

impl<'c> ConversionPlan<'c> {
    fn new(config: &'c Configuration, vm_name: &str) -> Self {
        let vnet_resource_group = config
            .existing_vnet_resource_group
            .as_deref()
            .map(str::trim)
            .filter(|rg| !rg.is_empty())
            .map(str::to_string);
        Self {
            config,
            vm_name: vm_name.to_string(),
            existing: config.network_mode == NetworkMode::UseExisting,
            linux: config.os_type == OsType::Linux,
            vnet_resource_group,
        }
    }

    fn parameters(&self, builder: DocumentBuilder) -> DocumentBuilder {
        let config = self.config;
        let location_description = if self.existing {
            "Location for VM resources"
        } else {
            "Location for all resources"
        };

        let mut builder = builder
            .param(
                Param::new("vmName", BicepType::String)
                    .describe("Virtual Machine name")
                    .default_value(BicepValue::str(self.vm_name.as_str())),
            )
            .param(
                Param::new("location", BicepType::String)
                    .describe(location_description)
                    .default_value(BicepValue::str(config.conversion_location())),
            );

        if self.existing {
            builder = builder
                .param(
                    Param::new("existingVnetName", BicepType::String)
                        .describe("Existing Virtual Network name")
                        .default_value(BicepValue::str(config.existing_vnet_name.clone().unwrap_or_default())),
                )
                .param(
                    Param::new("existingSubnetName", BicepType::String)
                        .describe("Existing Subnet name")
                        .default_value(BicepValue::str(config.existing_subnet_name.clone().unwrap_or_default())),
                );
            if let Some(resource_group) = &self.vnet_resource_group {
                builder = builder.param(
                    Param::new("vnetResourceGroupName", BicepType::String)
                        .describe("Resource Group containing the VNet")
                        .default_value(BicepValue::str(resource_group.as_str())),
                );
            }
        }

        builder = builder
            .param(
                Param::new("adminUsername", BicepType::String)
                    .describe("Administrator username")
                    .default_value(BicepValue::str(config.admin_username.as_str())),
            )
            .param(
                Param::new("adminPasswordOrKey", BicepType::String)
                    .describe("Administrator password or SSH key")
                    .secure(),
            )
            .param(
                Param::new("vmSize", BicepType::String)
                    .describe("Virtual Machine size")
                    .default_value(BicepValue::str(config.vm_size.as_str())),
            )
            .param(
                Param::new("osType", BicepType::String)
                    .describe("OS Type")
                    .allowed(["Linux", "Windows"])
                    .default_value(BicepValue::str(config.os_type.as_str())),
            );

        if !self.existing {
            builder = builder.param(
                Param::new("environment", BicepType::String)
                    .describe("Environment tag")
                    .default_value(BicepValue::str(config.environment.as_str())),
            );
        }
        builder
    }

    fn variables(&self, builder: DocumentBuilder) -> DocumentBuilder {
        let config = self.config;
        let mut variables = vec![Variable::new(
            "vmNameClean",
            BicepValue::call(
                "toLower",
                vec![BicepValue::call(
                    "replace",
                    vec![BicepValue::expr("vmName"), BicepValue::str(" "), BicepValue::str("-")],
                )],
            ),
        )];
        if config.include_nsg {
            variables.push(Variable::new("networkSecurityGroupName", BicepValue::interp("${vmNameClean}-nsg")));
        }
        if !self.existing {
            variables.push(Variable::new("virtualNetworkName", BicepValue::interp("${vmNameClean}-vnet")));
            variables.push(Variable::new("subnetName", BicepValue::str("default")));
        }
        variables.push(Variable::new("networkInterfaceName", BicepValue::interp("${vmNameClean}-nic")));
        variables.push(Variable::new("osDiskName", BicepValue::interp("${vmNameClean}-osdisk")));
        if config.include_public_ip {
            variables.push(Variable::new("publicIPAddressName", BicepValue::interp("${vmNameClean}-pip")));
        }
        if !self.existing {
            variables.push(Variable::new("vnetAddressSpace", BicepValue::str(config.vnet_address_space.as_str())));
            variables.push(Variable::new(
                "subnetAddressSpace",
                BicepValue::str(config.subnet_address_space.as_str()),
            ));
        }
        builder.variables(variables)
    }

    fn resources(&self, mut builder: DocumentBuilder) -> DocumentBuilder {
        if self.existing {
            builder = builder.resource(self.existing_vnet()).resource(self.existing_subnet());
        }
        if self.config.include_nsg {
            builder = builder.resource(self.network_security_group());
        }
        if !self.existing {
            builder = builder.resource(self.virtual_network());
        }
        if self.config.include_public_ip {
            builder = builder.resource(self.public_ip_address());
        }
        builder.resource(self.network_interface()).resource(self.virtual_machine())
    }

    /// Name, location and, for newly created networks, the environment tag.
    fn located(&self, name: &str) -> Body {
        Body::new()
            .prop("name", BicepValue::expr(name))
            .prop("location", BicepValue::expr("location"))
            .prop_if(
                !self.existing,
                "tags",
                Body::new().prop("environment", BicepValue::expr("environment")),
            )
    }

    fn existing_vnet(&self) -> ResourceDecl {
        let comment = if self.vnet_resource_group.is_some() {
            "Reference existing VNet in different resource group"
        } else {
            "Reference existing VNet in same resource group"
        };
        let body = Body::new().prop("name", BicepValue::expr("existingVnetName")).prop_if(
            self.vnet_resource_group.is_some(),
            "scope",
            BicepValue::call("resourceGroup", vec![BicepValue::expr("vnetResourceGroupName")]),
        );
        ResourceDecl::new("existingVnet", VIRTUAL_NETWORK_TYPE, NETWORK_API_VERSION)
            .existing()
            .with_comment(comment)
            .with_body(body)
    }

    fn existing_subnet(&self) -> ResourceDecl {
        ResourceDecl::new("existingSubnet", SUBNET_TYPE, NETWORK_API_VERSION)
            .existing()
            .with_body(
                Body::new()
                    .prop("parent", BicepValue::expr("existingVnet"))
                    .prop("name", BicepValue::expr("existingSubnetName")),
            )
    }

    fn network_security_group(&self) -> ResourceDecl {
        let (rule, port) = if self.linux { ("SSH", "22") } else { ("RDP", "3389") };
        let security_rule = Body::new().prop("name", BicepValue::str(rule)).prop(
            "properties",
            Body::new()
                .prop("priority", 1001i64)
                .prop("access", BicepValue::str("Allow"))
                .prop("direction", BicepValue::str("Inbound"))
                .prop("destinationPortRange", BicepValue::str(port))
                .prop("protocol", BicepValue::str("Tcp"))
                .prop("sourcePortRange", BicepValue::str("*"))
                .prop("sourceAddressPrefix", BicepValue::str("*"))
                .prop("destinationAddressPrefix", BicepValue::str("*")),
        );
        let body = self.located("networkSecurityGroupName").prop(
            "properties",
            Body::new().prop("securityRules", BicepValue::Array(vec![security_rule.into()])),
        );
        ResourceDecl::new("networkSecurityGroup", NETWORK_SECURITY_GROUP_TYPE, NETWORK_API_VERSION)
            .with_comment("Network Security Group")
            .with_body(body)
    }

    fn virtual_network(&self) -> ResourceDecl {
        let subnet_properties = Body::new()
            .prop("addressPrefix", BicepValue::expr("subnetAddressSpace"))
            .prop_if(self.config.include_nsg, "networkSecurityGroup", id_of("networkSecurityGroup"));
        let subnet = Body::new()
            .prop("name", BicepValue::expr("subnetName"))
            .prop("properties", subnet_properties);
        let body = self.located("virtualNetworkName").prop(
            "properties",
            Body::new()
                .prop(
                    "addressSpace",
                    Body::new().prop(
                        "addressPrefixes",
                        BicepValue::Array(vec![BicepValue::expr("vnetAddressSpace")]),
                    ),
                )
                .prop("subnets", BicepValue::Array(vec![subnet.into()])),
        );
        ResourceDecl::new("virtualNetwork", VIRTUAL_NETWORK_TYPE, NETWORK_API_VERSION)
            .with_comment("Virtual Network")
            .with_body(body)
    }

    fn public_ip_address(&self) -> ResourceDecl {
        let body = self
            .located("publicIPAddressName")
            .prop("sku", Body::new().prop("name", BicepValue::str("Standard")))
            .prop(
                "properties",
                Body::new()
                    .prop("publicIPAllocationMethod", BicepValue::str("Static"))
                    .prop(
                        "dnsSettings",
                        Body::new().prop("domainNameLabel", BicepValue::expr("vmNameClean")),
                    ),
            );
        ResourceDecl::new("publicIPAddress", PUBLIC_IP_ADDRESS_TYPE, NETWORK_API_VERSION)
            .with_comment("Public IP Address")
            .with_body(body)
    }

    fn network_interface(&self) -> ResourceDecl {
        let subnet_id = if self.existing {
            "existingSubnet.id"
        } else {
            "virtualNetwork.properties.subnets[0].id"
        };
        let ip_configuration = Body::new().prop("name", BicepValue::str("ipconfig1")).prop(
            "properties",
            Body::new()
                .prop("privateIPAllocationMethod", BicepValue::str("Dynamic"))
                .prop("subnet", Body::new().prop("id", BicepValue::expr(subnet_id)))
                .prop_if(self.config.include_public_ip, "publicIPAddress", id_of("publicIPAddress")),
        );
        // New networks attach the NSG to the subnet instead.
        let properties = Body::new()
            .prop("ipConfigurations", BicepValue::Array(vec![ip_configuration.into()]))
            .prop_if(
                self.existing && self.config.include_nsg,
                "networkSecurityGroup",
                id_of("networkSecurityGroup"),
            );
        ResourceDecl::new("networkInterface", NETWORK_INTERFACE_TYPE, NETWORK_API_VERSION)
            .with_comment("Network Interface")
            .with_body(self.located("networkInterfaceName").prop("properties", properties))
    }

    fn virtual_machine(&self) -> ResourceDecl {
        let os_configuration = if self.linux {
            (
                "linuxConfiguration",
                Body::new().prop("disablePasswordAuthentication", false),
            )
        } else {
            (
                "windowsConfiguration",
                Body::new().prop("enableAutomaticUpdates", true),
            )
        };
        let os_profile = Body::new()
            .prop("computerName", BicepValue::expr("vmName"))
            .prop("adminUsername", BicepValue::expr("adminUsername"))
            .prop("adminPassword", BicepValue::expr("adminPasswordOrKey"))
            .prop(os_configuration.0, os_configuration.1);
        let storage_profile = Body::new()
            .prop("imageReference", rules::image_reference(self.config))
            .prop(
                "osDisk",
                Body::new()
                    .prop("name", BicepValue::expr("osDiskName"))
                    .prop("caching", BicepValue::str("ReadWrite"))
                    .prop("createOption", BicepValue::str("FromImage"))
                    .prop(
                        "managedDisk",
                        Body::new().prop("storageAccountType", BicepValue::str("Premium_LRS")),
                    ),
            );
        let properties = Body::new()
            .prop("hardwareProfile", Body::new().prop("vmSize", BicepValue::expr("vmSize")))
            .prop("osProfile", os_profile)
            .prop("storageProfile", storage_profile)
            .prop(
                "networkProfile",
                Body::new().prop(
                    "networkInterfaces",
                    BicepValue::Array(vec![id_of("networkInterface").into()]),
                ),
            )
            .prop_if(
                self.config.include_boot_diagnostics,
                "diagnosticsProfile",
                Body::new().prop("bootDiagnostics", Body::new().prop("enabled", true)),
            );

        ResourceDecl::new("virtualMachine", VIRTUAL_MACHINE_TYPE, COMPUTE_API_VERSION)
            .with_comment("Virtual Machine")
            .with_body(self.located("vmName").prop("properties", properties))
    }

    fn outputs(&self, builder: DocumentBuilder) -> DocumentBuilder {
        let mut outputs = vec![
            Output::new("vmId", BicepType::String, BicepValue::expr("virtualMachine.id")),
            Output::new("vmName", BicepType::String, BicepValue::expr("virtualMachine.name")),
        ];
        if self.existing {
            outputs.push(Output::new(
                "existingVnetUsed",
                BicepType::String,
                BicepValue::expr("existingVnet.name"),
            ));
            outputs.push(Output::new(
                "existingSubnetUsed",
                BicepType::String,
                BicepValue::expr("existingSubnet.name"),
            ));
        }
        if self.config.include_public_ip {
            outputs.push(Output::new(
                "publicIPAddress",
                BicepType::String,
                BicepValue::expr("publicIPAddress.properties.ipAddress"),
            ));
        }
        outputs.push(Output::new("privateIPAddress", BicepType::String, BicepValue::expr(PRIVATE_IP)));
        outputs.push(Output::new("connectionCommand", BicepType::String, self.connection_command()));
        builder.outputs(outputs)
    }

    /// `ssh` for Linux, `mstsc` for Windows, aimed at the public DNS name
    /// when one exists and the private address otherwise.
    fn connection_command(&self) -> BicepValue {
        let host = if self.config.include_public_ip {
            format!("${{{}}}", PUBLIC_FQDN)
        } else {
            format!("${{{}}}", PRIVATE_IP)
        };
        if self.linux {
            BicepValue::interp(format!("ssh ${{adminUsername}}@{}", host))
        } else {
            BicepValue::interp(format!("mstsc /v:{}", host))
        }
    }
}

fn id_of(symbol: &str) -> Body {
    Body::new().prop("id", BicepValue::expr(format!("{}.id", symbol)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsb_core::{CoreError, FixedClock};
    use serde_json::json;
    use std::sync::Arc;

    fn template() -> DeploymentTemplate {
        DeploymentTemplate::from_value(json!({
            "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
            "contentVersion": "1.0.0.0",
            "resources": [{
                "type": "Microsoft.Compute/virtualMachines",
                "apiVersion": "2022-08-01",
                "name": "[parameters('virtualMachines_app01_name')]",
                "properties": {
                    "networkProfile": {
                        "networkInterfaces": [{ "id": "[parameters('nic_externalid')]" }]
                    }
                }
            }]
        }))
    }

    fn ctx() -> GenerationContext {
        GenerationContext::new().with_clock(Arc::new(FixedClock::epoch()))
    }

    fn symbols(doc: &GeneratedDocument) -> Vec<&str> {
        doc.declarations().iter().map(|d| d.symbol()).collect()
    }

    #[test]
    fn test_convert_requires_analysis() {
        let ctx = ctx();
        let config = Configuration::default();
        let converter = ArmConverter::new(&ctx, &config);
        assert!(matches!(converter.convert(), Err(IacError::NotAnalyzed)));
    }

    #[test]
    fn test_new_network_conversion() {
        let ctx = ctx();
        let config = Configuration::default();
        let mut converter = ArmConverter::new(&ctx, &config);
        converter.analyze(&template());
        let doc = converter.convert().unwrap();

        assert_eq!(
            symbols(&doc),
            vec![
                "networkSecurityGroup",
                "virtualNetwork",
                "publicIPAddress",
                "networkInterface",
                "virtualMachine"
            ]
        );
        assert_eq!(
            doc.param("vmName").unwrap().default,
            Some(BicepValue::str("virtualMachines_app01"))
        );
        assert_eq!(doc.param("location").unwrap().default, Some(BicepValue::str("eastus")));
        assert!(doc.param("adminPasswordOrKey").unwrap().is_secure());
        assert!(doc.has_param("environment"));
        assert!(doc.variable("vnetAddressSpace").is_some());

        let text = doc.render();
        assert!(text.contains("resource virtualNetwork 'Microsoft.Network/virtualNetworks@2023-05-01' = {"));
        assert!(text.contains("'Microsoft.Compute/virtualMachines@2024-11-01'"));
        assert!(text.contains("name: 'RDP'"));
        assert!(text.contains("output connectionCommand string = 'mstsc /v:${publicIPAddress.properties.dnsSettings.fqdn}'"));
    }

    #[test]
    fn test_existing_network_conversion() {
        let ctx = ctx();
        let mut config = Configuration::default()
            .with_existing_network("hub-vnet", "workloads")
            .with_os_type(OsType::Linux);
        config.existing_vnet_resource_group = Some("network-rg".to_string());
        config.include_public_ip = false;

        let mut converter = ArmConverter::new(&ctx, &config);
        converter.analyze(&template());
        let doc = converter.convert().unwrap();

        assert_eq!(
            symbols(&doc),
            vec![
                "existingVnet",
                "existingSubnet",
                "networkSecurityGroup",
                "networkInterface",
                "virtualMachine"
            ]
        );
        assert!(doc.has_param("vnetResourceGroupName"));
        assert!(!doc.has_param("environment"));
        assert!(doc.output("publicIPAddress").is_none());
        assert!(doc.output("existingSubnetUsed").is_some());

        let vnet = doc.resource("existingVnet").unwrap();
        assert!(vnet.existing);
        assert_eq!(
            vnet.body.get("scope"),
            Some(&BicepValue::call("resourceGroup", vec![BicepValue::expr("vnetResourceGroupName")]))
        );

        let text = doc.render();
        assert!(text.contains("name: 'SSH'"));
        assert!(text.contains("destinationPortRange: '22'"));
        assert!(text.contains("publisher: 'Canonical'"));
        assert!(text.contains(
            "'ssh ${adminUsername}@${networkInterface.properties.ipConfigurations[0].properties.privateIPAddress}'"
        ));
    }

    #[test]
    fn test_existing_network_requires_names() {
        let ctx = ctx();
        let config = Configuration::default().with_network_mode(NetworkMode::UseExisting);
        let mut converter = ArmConverter::new(&ctx, &config);
        converter.analyze(&template());

        match converter.convert() {
            Err(IacError::Core(CoreError::MissingConfiguration { fields })) => {
                assert_eq!(fields, vec!["existingVnetName", "existingSubnetName"]);
            }
            other => panic!("expected missing configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_blocks_disabled() {
        let ctx = ctx();
        let mut config = Configuration::default();
        config.include_nsg = false;
        config.include_public_ip = false;
        config.include_boot_diagnostics = false;

        let mut converter = ArmConverter::new(&ctx, &config);
        converter.analyze(&template());
        let doc = converter.convert().unwrap();

        assert_eq!(symbols(&doc), vec!["virtualNetwork", "networkInterface", "virtualMachine"]);
        assert!(doc.variable("networkSecurityGroupName").is_none());
        assert!(!doc.render().contains("diagnosticsProfile"));
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let ctx = ctx();
        let config = Configuration::default();
        let mut converter = ArmConverter::new(&ctx, &config);
        converter.analyze(&template());
        assert_eq!(converter.convert().unwrap().render(), converter.convert().unwrap().render());
    }
}
