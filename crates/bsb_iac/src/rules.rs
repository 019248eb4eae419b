//! Per-type generation tables.
//!
//! Each resource kind with dedicated support contributes parameters,
//! variables, a resource body and outputs. Everything else goes through the
//! generic routines, which derive parameters from the schema itself.

use serde_json::Value;
use tracing::debug;

use bsb_core::{Configuration, ResourceKind, DEPLOYMENT_TEMPLATE_SCHEMA};

use crate::bicep::{BicepType, BicepValue, Body, Decorator, Output, Param, ResourceDecl, Variable};

/// Schema properties that never become generic parameters.
pub const IDENTITY_FIELDS: [&str; 6] = ["apiVersion", "type", "name", "location", "properties", "tags"];

/// Substrings marking a property as sensitive.
const SENSITIVE_MARKERS: [&str; 5] = ["password", "secret", "key", "token", "connectionstring"];

pub const ENVIRONMENTS: [&str; 4] = ["dev", "test", "staging", "prod"];

pub const GENERATOR_NAME: &str = "Bicep Schema Builder";

pub fn is_sensitive(name: &str) -> bool {
    let name = name.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Whether `name` can be used as a Bicep identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Symbol for a resource type: its last segment, lower camel case, with
/// everything but ASCII letters and digits removed.
pub fn resource_symbol(resource_type: &str) -> String {
    let last = resource_type.rsplit('/').next().unwrap_or(resource_type);
    let cleaned: String = last.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => "resource".to_string(),
    }
}

/// Derive one parameter from a JSON Schema property.
pub fn parameter_from_schema(name: &str, schema: &Value) -> Param {
    let description = schema
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Parameter for {}", name));

    let mut param = Param::new(name, BicepType::from_json_schema(schema)).describe(description);

    if let Some(n) = schema.get("minLength").and_then(Value::as_u64) {
        param = param.decorate(Decorator::MinLength(n));
    }
    if let Some(n) = schema.get("maxLength").and_then(Value::as_u64) {
        param = param.decorate(Decorator::MaxLength(n));
    }
    if let Some(n) = integer_bound(name, schema, "minimum", f64::ceil) {
        param = param.decorate(Decorator::MinValue(n));
    }
    if let Some(n) = integer_bound(name, schema, "maximum", f64::floor) {
        param = param.decorate(Decorator::MaxValue(n));
    }
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        param = param.decorate(Decorator::Allowed(values.iter().map(BicepValue::from_json).collect()));
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        param = param.decorate(Decorator::Note(format!("Pattern validation: {}", pattern)));
    }
    if is_sensitive(name) {
        param = param.secure();
    }
    if let Some(default) = schema.get("default") {
        param = param.default_value(BicepValue::from_json(default));
    }

    param
}

/// Bicep value bounds are integers. Fractional bounds are rounded inward
/// (`minimum` up, `maximum` down) so every allowed value stays in range.
fn integer_bound(name: &str, schema: &Value, keyword: &str, round: fn(f64) -> f64) -> Option<i64> {
    let value = schema.get(keyword)?;
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let n = value.as_f64()?;
    let rounded = round(n);
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        debug!("Skipping out-of-range {} {} on {}", keyword, n, name);
        return None;
    }
    debug!("Rounded fractional {} {} on {} to {}", keyword, n, name, rounded);
    Some(rounded as i64)
}

/// Parameters every generated document starts with.
pub fn base_parameters(supports_location_and_tags: bool, config: &Configuration) -> Vec<Param> {
    let mut params = vec![Param::new("resourceName", BicepType::String)
        .describe("The name of the resource")
        .decorate(Decorator::MinLength(1))
        .decorate(Decorator::MaxLength(80))];

    if supports_location_and_tags {
        let location = match config.location.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(location) => BicepValue::str(location),
            None => BicepValue::expr("resourceGroup().location"),
        };
        params.push(
            Param::new("location", BicepType::String)
                .describe("The location for the resource")
                .default_value(location),
        );
    }

    let environment = if ENVIRONMENTS.contains(&config.environment.as_str()) {
        config.environment.clone()
    } else {
        "dev".to_string()
    };
    params.push(
        Param::new("environment", BicepType::String)
            .describe("Environment name (e.g., dev, test, prod)")
            .allowed(ENVIRONMENTS)
            .default_value(BicepValue::str(environment)),
    );

    if supports_location_and_tags {
        params.push(
            Param::new("tags", BicepType::Object)
                .describe("Resource tags")
                .default_value(
                    Body::new()
                        .prop("Environment", BicepValue::expr("environment"))
                        .prop("CreatedBy", BicepValue::str(GENERATOR_NAME))
                        .prop("CreatedDate", BicepValue::expr("utcNow('yyyy-MM-dd')")),
                ),
        );
    }

    params
}

/// Parameters from the kind's dedicated table.
pub fn specific_parameters(kind: ResourceKind, config: &Configuration) -> Vec<Param> {
    match kind {
        ResourceKind::VirtualNetwork => vec![
            Param::new("addressSpaces", BicepType::Array)
                .describe("Address space for the virtual network")
                .default_value(BicepValue::strings([config.vnet_address_space.clone()])),
            Param::new("subnets", BicepType::Array)
                .describe("Subnets configuration")
                .default_value(BicepValue::Array(vec![Body::new()
                    .prop("name", BicepValue::str("default"))
                    .prop("addressPrefix", BicepValue::str(config.subnet_address_space.clone()))
                    .prop("networkSecurityGroup", BicepValue::Null)
                    .prop("routeTable", BicepValue::Null)
                    .into()])),
            Param::new("enableDdosProtection", BicepType::Bool)
                .describe("Enable DDoS protection")
                .default_value(false),
            Param::new("enableVmProtection", BicepType::Bool)
                .describe("Enable VM protection")
                .default_value(false),
        ],
        ResourceKind::StorageAccount => vec![
            Param::new("skuName", BicepType::String)
                .describe("Storage account SKU")
                .allowed([
                    "Standard_LRS",
                    "Standard_GRS",
                    "Standard_RAGRS",
                    "Standard_ZRS",
                    "Premium_LRS",
                    "Premium_ZRS",
                ])
                .default_value(BicepValue::str("Standard_LRS")),
            Param::new("kind", BicepType::String)
                .describe("Storage account kind")
                .allowed(["Storage", "StorageV2", "BlobStorage", "FileStorage", "BlockBlobStorage"])
                .default_value(BicepValue::str("StorageV2")),
            Param::new("accessTier", BicepType::String)
                .describe("Access tier for blob storage")
                .allowed(["Hot", "Cool"])
                .default_value(BicepValue::str("Hot")),
            Param::new("allowBlobPublicAccess", BicepType::Bool)
                .describe("Allow blob public access")
                .default_value(false),
            Param::new("supportsHttpsTrafficOnly", BicepType::Bool)
                .describe("Require secure transfer")
                .default_value(true),
        ],
        ResourceKind::WebSite => vec![
            Param::new("appServicePlanId", BicepType::String).describe("App Service Plan resource ID"),
            Param::new("appSettings", BicepType::Array)
                .describe("Application settings")
                .default_value(BicepValue::Array(Vec::new())),
            Param::new("connectionStrings", BicepType::Array)
                .describe("Connection strings")
                .default_value(BicepValue::Array(Vec::new())),
            Param::new("httpsOnly", BicepType::Bool)
                .describe("Enable HTTPS only")
                .default_value(true),
            Param::new("runtimeStack", BicepType::String)
                .describe("Runtime stack")
                .allowed(["dotnet", "node", "python", "java", "php"])
                .default_value(BicepValue::str("dotnet")),
        ],
        ResourceKind::VirtualMachine => vec![
            Param::new("vmSize", BicepType::String)
                .describe("Virtual machine size")
                .allowed([
                    "Standard_B1s",
                    "Standard_B1ms",
                    "Standard_B2s",
                    "Standard_B2ms",
                    "Standard_D2s_v3",
                    "Standard_D4s_v3",
                    "Standard_D8s_v3",
                ])
                .default_value(BicepValue::str(config.vm_size.clone())),
            Param::new("adminUsername", BicepType::String)
                .describe("Admin username for the VM")
                .decorate(Decorator::MinLength(3))
                .decorate(Decorator::MaxLength(20))
                .default_value(BicepValue::str(config.admin_username.clone())),
            Param::new("adminPassword", BicepType::String)
                .describe("Admin password for the VM")
                .secure()
                .decorate(Decorator::MinLength(8)),
            Param::new("osType", BicepType::String)
                .describe("Operating system type")
                .allowed(["Windows", "Linux"])
                .default_value(BicepValue::str(config.os_type.as_str())),
            Param::new("osDiskType", BicepType::String)
                .describe("OS disk type")
                .allowed(["Standard_LRS", "StandardSSD_LRS", "Premium_LRS"])
                .default_value(BicepValue::str("StandardSSD_LRS")),
            Param::new("subnetId", BicepType::String)
                .describe("Subnet resource ID for the VM network interface"),
            Param::new("enableAcceleratedNetworking", BicepType::Bool)
                .describe("Enable accelerated networking")
                .default_value(false),
            Param::new("imageReference", BicepType::Object)
                .describe("VM image configuration")
                .default_value(image_reference(config)),
        ],
        ResourceKind::NestedDeployment | ResourceKind::Generic => Vec::new(),
    }
}

/// Marketplace image for the configured operating system.
pub fn image_reference(config: &Configuration) -> Body {
    match config.os_type {
        bsb_core::OsType::Linux => Body::new()
            .prop("publisher", BicepValue::str("Canonical"))
            .prop("offer", BicepValue::str("0001-com-ubuntu-server-jammy"))
            .prop("sku", BicepValue::str("22_04-lts-gen2"))
            .prop("version", BicepValue::str("latest")),
        bsb_core::OsType::Windows => Body::new()
            .prop("publisher", BicepValue::str("MicrosoftWindowsServer"))
            .prop("offer", BicepValue::str("WindowsServer"))
            .prop("sku", BicepValue::str("2022-datacenter-azure-edition"))
            .prop("version", BicepValue::str("latest")),
    }
}

/// Variables every generated document declares.
pub fn base_variables(resource_type: &str, supports_location_and_tags: bool) -> Vec<Variable> {
    let mut variables = vec![Variable::new(
        "resourceNameFormatted",
        BicepValue::expr("toLower(replace(resourceName, ' ', '-'))"),
    )];

    if supports_location_and_tags {
        variables.push(Variable::new(
            "commonTags",
            BicepValue::call(
                "union",
                vec![
                    BicepValue::expr("tags"),
                    Body::new()
                        .prop("ResourceType", BicepValue::str(resource_type))
                        .prop("DeployedBy", BicepValue::str(GENERATOR_NAME))
                        .into(),
                ],
            ),
        ));
    }

    variables
}

pub fn specific_variables(kind: ResourceKind) -> Vec<Variable> {
    match kind {
        ResourceKind::VirtualNetwork => vec![Variable::new(
            "subnetsFormatted",
            BicepValue::for_each(
                "(subnet, i)",
                "subnets",
                Body::new()
                    .prop("name", BicepValue::expr("subnet.name"))
                    .prop(
                        "properties",
                        Body::new()
                            .prop("addressPrefix", BicepValue::expr("subnet.addressPrefix"))
                            .prop(
                                "networkSecurityGroup",
                                BicepValue::conditional(
                                    "subnet.networkSecurityGroup != null",
                                    Body::new().prop("id", BicepValue::expr("subnet.networkSecurityGroup")).into(),
                                    BicepValue::Null,
                                ),
                            )
                            .prop(
                                "routeTable",
                                BicepValue::conditional(
                                    "subnet.routeTable != null",
                                    Body::new().prop("id", BicepValue::expr("subnet.routeTable")).into(),
                                    BicepValue::Null,
                                ),
                            ),
                    )
                    .into(),
            ),
        )],
        ResourceKind::StorageAccount => vec![
            Variable::new(
                "storageAccountName",
                BicepValue::expr("replace(resourceNameFormatted, '-', '')"),
            ),
            Variable::new(
                "networkAcls",
                Body::new()
                    .prop("defaultAction", BicepValue::str("Allow"))
                    .prop("bypass", BicepValue::str("AzureServices")),
            ),
        ],
        ResourceKind::WebSite => vec![
            Variable::new(
                "appSettingsFormatted",
                BicepValue::for_each(
                    "setting",
                    "appSettings",
                    Body::new()
                        .prop("name", BicepValue::expr("setting.name"))
                        .prop("value", BicepValue::expr("setting.value"))
                        .into(),
                ),
            ),
            Variable::new(
                "connectionStringsFormatted",
                BicepValue::for_each(
                    "conn",
                    "connectionStrings",
                    Body::new()
                        .prop("name", BicepValue::expr("conn.name"))
                        .prop("connectionString", BicepValue::expr("conn.connectionString"))
                        .prop("type", BicepValue::expr("conn.type"))
                        .into(),
                ),
            ),
        ],
        _ => Vec::new(),
    }
}

/// Resource body for kinds with a dedicated table. `None` for kinds that
/// use the generic body.
pub fn specific_body(kind: ResourceKind, symbol: &str, config: &Configuration) -> Option<Body> {
    let body = match kind {
        ResourceKind::VirtualNetwork => Body::new().prop(
            "properties",
            Body::new()
                .prop(
                    "addressSpace",
                    Body::new().prop("addressPrefixes", BicepValue::expr("addressSpaces")),
                )
                .prop("subnets", BicepValue::expr("subnetsFormatted"))
                .prop("enableDdosProtection", BicepValue::expr("enableDdosProtection"))
                .prop("enableVmProtection", BicepValue::expr("enableVmProtection")),
        ),
        ResourceKind::StorageAccount => {
            let encryption_service = || {
                Body::new()
                    .prop("keyType", BicepValue::str("Account"))
                    .prop("enabled", true)
            };
            Body::new()
                .prop("sku", Body::new().prop("name", BicepValue::expr("skuName")))
                .prop("kind", BicepValue::expr("kind"))
                .prop(
                    "properties",
                    Body::new()
                        .prop("accessTier", BicepValue::expr("accessTier"))
                        .prop("allowBlobPublicAccess", BicepValue::expr("allowBlobPublicAccess"))
                        .prop("supportsHttpsTrafficOnly", BicepValue::expr("supportsHttpsTrafficOnly"))
                        .prop("networkAcls", BicepValue::expr("networkAcls"))
                        .prop(
                            "encryption",
                            Body::new()
                                .prop(
                                    "services",
                                    Body::new()
                                        .prop("file", encryption_service())
                                        .prop("blob", encryption_service()),
                                )
                                .prop("keySource", BicepValue::str("Microsoft.Storage")),
                        ),
                )
        }
        ResourceKind::WebSite => Body::new().prop(
            "properties",
            Body::new()
                .prop("serverFarmId", BicepValue::expr("appServicePlanId"))
                .prop("httpsOnly", BicepValue::expr("httpsOnly"))
                .prop(
                    "siteConfig",
                    Body::new()
                        .prop("appSettings", BicepValue::expr("appSettingsFormatted"))
                        .prop("connectionStrings", BicepValue::expr("connectionStringsFormatted"))
                        .prop(
                            "metadata",
                            BicepValue::Array(vec![Body::new()
                                .prop("name", BicepValue::str("CURRENT_STACK"))
                                .prop("value", BicepValue::expr("runtimeStack"))
                                .into()]),
                        ),
                ),
        ),
        ResourceKind::VirtualMachine => Body::new().prop("properties", vm_properties(symbol, config)),
        ResourceKind::NestedDeployment => Body::new().prop("properties", nested_deployment_properties()),
        ResourceKind::Generic => return None,
    };
    Some(body)
}

fn vm_properties(symbol: &str, config: &Configuration) -> Body {
    Body::new()
        .prop("hardwareProfile", Body::new().prop("vmSize", BicepValue::expr("vmSize")))
        .prop(
            "osProfile",
            Body::new()
                .prop("computerName", BicepValue::expr("take(resourceNameFormatted, 15)"))
                .prop("adminUsername", BicepValue::expr("adminUsername"))
                .prop("adminPassword", BicepValue::expr("adminPassword"))
                .prop(
                    "windowsConfiguration",
                    BicepValue::conditional(
                        "osType == 'Windows'",
                        Body::new()
                            .prop("enableAutomaticUpdates", true)
                            .prop("provisionVMAgent", true)
                            .prop(
                                "patchSettings",
                                Body::new().prop("patchMode", BicepValue::str("AutomaticByOS")),
                            )
                            .into(),
                        BicepValue::Null,
                    ),
                )
                .prop(
                    "linuxConfiguration",
                    BicepValue::conditional(
                        "osType == 'Linux'",
                        Body::new()
                            .prop("disablePasswordAuthentication", false)
                            .prop("provisionVMAgent", true)
                            .into(),
                        BicepValue::Null,
                    ),
                ),
        )
        .prop(
            "storageProfile",
            Body::new()
                .prop("imageReference", BicepValue::expr("imageReference"))
                .prop(
                    "osDisk",
                    Body::new()
                        .prop("name", BicepValue::interp("${resourceNameFormatted}-osdisk"))
                        .prop("createOption", BicepValue::str("FromImage"))
                        .prop("caching", BicepValue::str("ReadWrite"))
                        .prop(
                            "managedDisk",
                            Body::new().prop("storageAccountType", BicepValue::expr("osDiskType")),
                        )
                        .prop("diskSizeGB", 128i64),
                ),
        )
        .prop(
            "networkProfile",
            Body::new().prop(
                "networkInterfaces",
                BicepValue::Array(vec![Body::new()
                    .prop("id", BicepValue::expr(format!("{}.id", nic_symbol(symbol))))
                    .prop("properties", Body::new().prop("primary", true))
                    .into()]),
            ),
        )
        .prop_if(
            config.include_boot_diagnostics,
            "diagnosticsProfile",
            Body::new().prop("bootDiagnostics", Body::new().prop("enabled", true)),
        )
}

/// Symbol of the network interface synthesized for a virtual machine.
pub fn nic_symbol(vm_symbol: &str) -> String {
    format!("{}NetworkInterface", vm_symbol)
}

/// Network interface declared ahead of a virtual machine.
pub fn network_interface(vm_symbol: &str, api_version: &str, supports_location_and_tags: bool) -> ResourceDecl {
    ResourceDecl::new(nic_symbol(vm_symbol), bsb_core::NETWORK_INTERFACE_TYPE, api_version)
        .with_comment("Network Interface for the Virtual Machine")
        .with_body(
            Body::new()
                .prop("name", BicepValue::interp("${resourceNameFormatted}-nic"))
                .prop_if(supports_location_and_tags, "location", BicepValue::expr("location"))
                .prop_if(supports_location_and_tags, "tags", BicepValue::expr("commonTags"))
                .prop(
                    "properties",
                    Body::new()
                        .prop(
                            "ipConfigurations",
                            BicepValue::Array(vec![Body::new()
                                .prop("name", BicepValue::str("ipconfig1"))
                                .prop(
                                    "properties",
                                    Body::new()
                                        .prop("privateIPAllocationMethod", BicepValue::str("Dynamic"))
                                        .prop("subnet", Body::new().prop("id", BicepValue::expr("subnetId"))),
                                )
                                .into()]),
                        )
                        .prop(
                            "enableAcceleratedNetworking",
                            BicepValue::expr("enableAcceleratedNetworking"),
                        ),
                ),
        )
}

/// Inner body of an incremental nested deployment with no resources.
pub fn nested_deployment_properties() -> Body {
    Body::new().prop("mode", BicepValue::str("Incremental")).prop(
        "template",
        Body::new()
            .prop("$schema", BicepValue::str(DEPLOYMENT_TEMPLATE_SCHEMA))
            .prop("contentVersion", BicepValue::str("1.0.0.0"))
            .prop("resources", BicepValue::Array(Vec::new())),
    )
}

/// Outputs every generated document declares.
pub fn base_outputs(symbol: &str, supports_location_and_tags: bool) -> Vec<Output> {
    let mut outputs = vec![
        Output::new("resourceId", BicepType::String, BicepValue::expr(format!("{}.id", symbol)))
            .describe("Resource ID of the created resource"),
        Output::new("resourceName", BicepType::String, BicepValue::expr(format!("{}.name", symbol)))
            .describe("Name of the created resource"),
    ];
    if supports_location_and_tags {
        outputs.push(
            Output::new("location", BicepType::String, BicepValue::expr(format!("{}.location", symbol)))
                .describe("Location of the created resource"),
        );
    }
    outputs
}

pub fn specific_outputs(kind: ResourceKind, symbol: &str) -> Vec<Output> {
    let expr = |suffix: &str| BicepValue::expr(format!("{}{}", symbol, suffix));
    match kind {
        ResourceKind::VirtualNetwork => vec![
            Output::new("addressSpace", BicepType::Array, expr(".properties.addressSpace.addressPrefixes"))
                .describe("Address space of the virtual network"),
            Output::new(
                "subnets",
                BicepType::Array,
                BicepValue::for_each(
                    "(subnet, i)",
                    format!("{}.properties.subnets", symbol),
                    Body::new()
                        .prop("name", BicepValue::expr("subnet.name"))
                        .prop("id", BicepValue::expr("subnet.id"))
                        .prop("addressPrefix", BicepValue::expr("subnet.properties.addressPrefix"))
                        .into(),
                ),
            )
            .describe("Subnets in the virtual network"),
        ],
        ResourceKind::StorageAccount => vec![
            Output::new("primaryEndpoints", BicepType::Object, expr(".properties.primaryEndpoints"))
                .describe("Primary endpoints of the storage account"),
            Output::new("primaryKey", BicepType::String, expr(".listKeys().keys[0].value"))
                .describe("Primary access key of the storage account"),
            Output::new(
                "connectionString",
                BicepType::String,
                BicepValue::interp(format!(
                    "DefaultEndpointsProtocol=https;AccountName=${{{s}.name}};AccountKey=${{{s}.listKeys().keys[0].value}};EndpointSuffix=core.windows.net",
                    s = symbol
                )),
            )
            .describe("Connection string for the storage account"),
        ],
        ResourceKind::WebSite => vec![
            Output::new("defaultHostName", BicepType::String, expr(".properties.defaultHostName"))
                .describe("Default hostname of the web app"),
            Output::new("outboundIpAddresses", BicepType::String, expr(".properties.outboundIpAddresses"))
                .describe("Outbound IP addresses"),
            Output::new(
                "siteUrl",
                BicepType::String,
                BicepValue::interp(format!("https://${{{}.properties.defaultHostName}}", symbol)),
            )
            .describe("Site URL"),
        ],
        ResourceKind::VirtualMachine => {
            let nic = nic_symbol(symbol);
            vec![
                Output::new(
                    "privateIPAddress",
                    BicepType::String,
                    BicepValue::expr(format!(
                        "{}.properties.ipConfigurations[0].properties.privateIPAddress",
                        nic
                    )),
                )
                .describe("Private IP address of the virtual machine"),
                Output::new("networkInterfaceId", BicepType::String, BicepValue::expr(format!("{}.id", nic)))
                    .describe("Network interface resource ID"),
                Output::new("vmSize", BicepType::String, expr(".properties.hardwareProfile.vmSize"))
                    .describe("Virtual machine size"),
                Output::new("osType", BicepType::String, BicepValue::expr("osType"))
                    .describe("Operating system type"),
                Output::new("computerName", BicepType::String, expr(".properties.osProfile.computerName"))
                    .describe("Computer name"),
            ]
        }
        ResourceKind::NestedDeployment | ResourceKind::Generic => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_symbol() {
        assert_eq!(resource_symbol("Microsoft.Storage/storageAccounts"), "storageAccounts");
        assert_eq!(resource_symbol("Microsoft.Web/Sites"), "sites");
        assert_eq!(resource_symbol("Contoso.X/my-thing_2"), "mything2");
        assert_eq!(resource_symbol("///"), "resource");
    }

    #[test]
    fn test_sensitive_names() {
        assert!(is_sensitive("adminPassword"));
        assert!(is_sensitive("StorageConnectionString"));
        assert!(is_sensitive("apiKey"));
        assert!(!is_sensitive("sku"));
    }

    #[test]
    fn test_fractional_bounds_round_inward() {
        let param = parameter_from_schema("ratio", &json!({ "type": "number", "minimum": 0.5, "maximum": 10.7 }));
        assert!(param.decorators.iter().any(|d| matches!(d, Decorator::MinValue(1))));
        assert!(param.decorators.iter().any(|d| matches!(d, Decorator::MaxValue(10))));

        let param = parameter_from_schema("count", &json!({ "type": "integer", "minimum": -3, "maximum": 5 }));
        assert!(param.decorators.iter().any(|d| matches!(d, Decorator::MinValue(-3))));
        assert!(param.decorators.iter().any(|d| matches!(d, Decorator::MaxValue(5))));

        let param = parameter_from_schema("huge", &json!({ "type": "number", "maximum": 1e300 }));
        assert!(!param.decorators.iter().any(|d| matches!(d, Decorator::MaxValue(_))));
    }

    #[test]
    fn test_parameter_from_schema_decorator_order() {
        let param = parameter_from_schema(
            "clientSecret",
            &json!({
                "type": "string",
                "minLength": 3,
                "maxLength": 10,
                "enum": ["a", "b"],
                "pattern": "^[a-z]+$",
                "default": "a"
            }),
        );

        assert_eq!(param.ty, BicepType::String);
        assert_eq!(param.description(), Some("Parameter for clientSecret"));
        assert!(matches!(param.decorators[1], Decorator::MinLength(3)));
        assert!(matches!(param.decorators[2], Decorator::MaxLength(10)));
        assert!(matches!(param.decorators[3], Decorator::Allowed(_)));
        assert!(matches!(param.decorators[4], Decorator::Note(_)));
        assert!(param.is_secure());
        assert_eq!(param.default, Some(BicepValue::str("a")));
    }

    #[test]
    fn test_parameter_type_mapping() {
        assert_eq!(parameter_from_schema("n", &json!({ "type": "number" })).ty, BicepType::Int);
        assert_eq!(parameter_from_schema("n", &json!({ "type": "boolean" })).ty, BicepType::Bool);
        assert_eq!(parameter_from_schema("n", &json!({})).ty, BicepType::String);
    }

    #[test]
    fn test_base_parameters_without_location() {
        let params = base_parameters(false, &Configuration::default());
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["resourceName", "environment"]);
    }

    #[test]
    fn test_base_parameters_configured_location() {
        let config = Configuration::default().with_location("westeurope");
        let params = base_parameters(true, &config);
        let location = params.iter().find(|p| p.name == "location").unwrap();
        assert_eq!(location.default, Some(BicepValue::str("westeurope")));
    }
}
