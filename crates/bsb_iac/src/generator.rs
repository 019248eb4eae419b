//! Single-resource Bicep generation.

use serde_json::{Map, Value};
use tracing::{debug, info};

use bsb_core::{
    Configuration, GenerationContext, ResourceKind, ResourceSchema, ResourceTypeInfo,
    NESTED_DEPLOYMENT_TYPE, NETWORK_INTERFACE_TYPE,
};

use crate::bicep::{BicepValue, Body, GeneratedDocument, Param, ResourceDecl};
use crate::rules::{self, GENERATOR_NAME, IDENTITY_FIELDS};

/// Variable names every document may declare, kept out of derived parameters.
const RESERVED_NAMES: [&str; 2] = ["resourceNameFormatted", "commonTags"];

/// Generic parameters derived from a schema, and where the resource body
/// binds them.
struct DerivedParameters {
    params: Vec<Param>,
    /// Derived from the nested `properties` bag rather than top-level fields.
    nested: bool,
}

/// Turns one resource schema into a Bicep document.
///
/// Output depends only on the schema, the resource type, the configuration
/// and the context's registry and clock. With a fixed clock two runs produce
/// identical text.
pub struct CodeGenerator<'a> {
    ctx: &'a GenerationContext,
    config: &'a Configuration,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(ctx: &'a GenerationContext, config: &'a Configuration) -> Self {
        Self { ctx, config }
    }

    /// Generate from a resource schema. The type comes from
    /// `properties.type`; schemas without one describe a nested deployment.
    pub fn generate(&self, schema: &ResourceSchema) -> GeneratedDocument {
        let resource_type = schema.resource_type().unwrap_or(NESTED_DEPLOYMENT_TYPE);
        self.generate_for_type(schema, resource_type)
    }

    /// Generate from one entry of a deployment template's `resources`.
    pub fn generate_from_template_entry(&self, entry: &Value) -> GeneratedDocument {
        let schema = ResourceSchema::from_template_entry(entry);
        self.generate(&schema)
    }

    /// Generate for an explicit resource type.
    pub fn generate_for_type(&self, schema: &ResourceSchema, resource_type: &str) -> GeneratedDocument {
        let registry = self.ctx.registry();
        let info = registry.lookup_scoped(resource_type, self.config.target_scope);
        let api_version = registry.select_api_version(schema, resource_type);
        let symbol = rules::resource_symbol(resource_type);
        let supports = info.supports_location_and_tags;

        info!("Generating Bicep for {}@{}", resource_type, api_version);
        if !info.registered {
            debug!("{} is not registered; using generic generation", resource_type);
        }

        let mut variables = rules::base_variables(resource_type, supports);
        variables.extend(rules::specific_variables(info.kind));

        let mut params = rules::base_parameters(supports, self.config);
        let derived = if info.kind.has_specific_tables() {
            params.extend(rules::specific_parameters(info.kind, self.config));
            None
        } else {
            // Derived names share one namespace with every other declaration.
            let taken: Vec<String> = params
                .iter()
                .map(|p| p.name.clone())
                .chain(variables.iter().map(|v| v.name.clone()))
                .chain(RESERVED_NAMES.iter().map(|n| n.to_string()))
                .chain(std::iter::once(symbol.clone()))
                .collect();
            let derived = derive_parameters(schema, &taken);
            params.extend(derived.params.iter().cloned());
            Some(derived)
        };
        debug!("Parameters: {}", params.len());

        let mut builder = GeneratedDocument::builder(self.config.target_scope)
            .header_line("Generated Bicep template from JSON Schema")
            .header_line(format!("Resource Type: {}", resource_type))
            .header_line(format!("Generated on: {}", self.ctx.clock().timestamp()))
            .metadata("description", format!("Bicep template for {}", resource_type))
            .metadata("author", GENERATOR_NAME)
            .metadata("version", "1.0.0")
            .params(params)
            .variables(variables);

        for auxiliary in self.auxiliary_resources(&info, &symbol) {
            builder = builder.resource(auxiliary);
        }
        builder = builder.resource(self.resource(&info, &symbol, &api_version, derived.as_ref()));

        if self.config.include_outputs {
            builder = builder
                .outputs(rules::base_outputs(&symbol, supports))
                .outputs(rules::specific_outputs(info.kind, &symbol));
        }

        builder.build()
    }

    fn auxiliary_resources(&self, info: &ResourceTypeInfo, symbol: &str) -> Vec<ResourceDecl> {
        info.auxiliary_resources
            .iter()
            .filter_map(|auxiliary| {
                if auxiliary == NETWORK_INTERFACE_TYPE && info.kind == ResourceKind::VirtualMachine {
                    let version = self
                        .ctx
                        .registry()
                        .lookup(NETWORK_INTERFACE_TYPE)
                        .latest_known_api_version()
                        .unwrap_or(bsb_core::FALLBACK_API_VERSION)
                        .to_string();
                    Some(rules::network_interface(symbol, &version, info.supports_location_and_tags))
                } else {
                    debug!("No generator for auxiliary resource {}", auxiliary);
                    None
                }
            })
            .collect()
    }

    fn resource(
        &self,
        info: &ResourceTypeInfo,
        symbol: &str,
        api_version: &str,
        derived: Option<&DerivedParameters>,
    ) -> ResourceDecl {
        let supports = info.supports_location_and_tags;
        let name = if info.kind == ResourceKind::StorageAccount {
            "storageAccountName"
        } else {
            "resourceNameFormatted"
        };

        let mut body = Body::new()
            .prop("name", BicepValue::expr(name))
            .prop_if(supports, "location", BicepValue::expr("location"))
            .prop_if(supports, "tags", BicepValue::expr("commonTags"));

        match rules::specific_body(info.kind, symbol, self.config) {
            Some(specific) => {
                for entry in specific.entries() {
                    body.push(entry.clone());
                }
            }
            None => body = generic_body(body, &info.resource_type, derived),
        }

        let decl = ResourceDecl::new(symbol, &info.resource_type, api_version).with_body(body);
        if info.kind == ResourceKind::VirtualMachine {
            decl.with_comment("Virtual Machine Resource")
        } else {
            decl
        }
    }
}

fn derive_parameters(schema: &ResourceSchema, taken: &[String]) -> DerivedParameters {
    let (source, nested) = match schema.resource_properties() {
        Some(properties) => (Some(properties), true),
        None => (schema.properties(), false),
    };

    let params = source
        .map(|properties| parameters_from(properties, taken))
        .unwrap_or_default();
    DerivedParameters { params, nested }
}

fn parameters_from(properties: &Map<String, Value>, taken: &[String]) -> Vec<Param> {
    properties
        .iter()
        .filter(|(name, schema)| {
            let usable = schema.is_object()
                && !IDENTITY_FIELDS.contains(&name.as_str())
                && !taken.iter().any(|t| t == *name)
                && rules::is_identifier(name);
            if !usable {
                debug!("Skipping property {} for parameter derivation", name);
            }
            usable
        })
        .map(|(name, schema)| rules::parameter_from_schema(name, schema))
        .collect()
}

/// Body for types without a dedicated table: derived parameters are bound
/// by name, either inside `properties` or at the top level.
fn generic_body(mut body: Body, resource_type: &str, derived: Option<&DerivedParameters>) -> Body {
    let placeholder = || {
        Body::new()
            .comment("Configure properties based on your requirements")
            .comment(format!("Refer to Azure documentation for {} properties", resource_type))
    };

    match derived {
        Some(derived) if derived.nested && !derived.params.is_empty() => {
            let mut properties = Body::new();
            for param in &derived.params {
                properties = properties.prop(param.name.clone(), BicepValue::expr(param.name.clone()));
            }
            body.prop("properties", properties)
        }
        Some(derived) => {
            for param in &derived.params {
                body = body.prop(param.name.clone(), BicepValue::expr(param.name.clone()));
            }
            body.prop("properties", placeholder())
        }
        None => body.prop("properties", placeholder()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsb_core::{FixedClock, TargetScope};
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> GenerationContext {
        GenerationContext::new().with_clock(Arc::new(FixedClock::epoch()))
    }

    fn schema_for(resource_type: &str) -> ResourceSchema {
        ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": resource_type },
                "apiVersion": { "enum": ["2021-01-01", "2023-01-01"] }
            }
        }))
    }

    #[test]
    fn test_storage_account_generation() {
        let ctx = ctx();
        let config = Configuration::default();
        let doc = CodeGenerator::new(&ctx, &config).generate(&schema_for("Microsoft.Storage/storageAccounts"));

        assert!(doc.has_param("skuName"));
        assert!(doc.has_param("location"));
        assert!(doc.variable("storageAccountName").is_some());

        let resource = doc.resource("storageAccounts").unwrap();
        assert_eq!(resource.api_version, "2022-05-01");
        assert_eq!(resource.body.get("name"), Some(&BicepValue::expr("storageAccountName")));
        assert!(resource.body.contains_key("sku"));
        assert!(doc.output("connectionString").is_some());
        assert!(doc.output("location").is_some());
    }

    #[test]
    fn test_nested_deployment_has_no_location_or_tags() {
        let ctx = ctx();
        let config = Configuration::default();
        let doc = CodeGenerator::new(&ctx, &config)
            .generate(&ResourceSchema::from_value(json!({ "type": "object" })));

        assert!(!doc.has_param("location"));
        assert!(!doc.has_param("tags"));
        assert!(doc.variable("commonTags").is_none());
        assert!(doc.output("location").is_none());

        let resource = doc.resource("deployments").unwrap();
        assert!(!resource.body.contains_key("location"));
        assert!(doc.render().contains("mode: 'Incremental'"));
    }

    #[test]
    fn test_nested_deployment_at_subscription_scope_has_location() {
        let ctx = ctx();
        let config = Configuration {
            target_scope: TargetScope::Subscription,
            ..Configuration::default()
        };
        let doc = CodeGenerator::new(&ctx, &config)
            .generate(&ResourceSchema::from_value(json!({ "type": "object" })));
        assert!(doc.has_param("location"));
        assert!(doc.render().starts_with("// Generated Bicep template"));
        assert!(doc.render().contains("targetScope = 'subscription'"));
    }

    #[test]
    fn test_vm_network_interface_precedes_vm() {
        let ctx = ctx();
        let config = Configuration::default();
        let doc = CodeGenerator::new(&ctx, &config).generate(&schema_for("Microsoft.Compute/virtualMachines"));

        let symbols: Vec<_> = doc.declarations().iter().map(|d| d.symbol()).collect();
        assert_eq!(symbols, vec!["virtualMachinesNetworkInterface", "virtualMachines"]);
        assert!(doc.param("adminPassword").unwrap().is_secure());
        assert!(doc.output("privateIPAddress").is_some());
    }

    #[test]
    fn test_boot_diagnostics_flag() {
        let ctx = ctx();
        let config = Configuration {
            include_boot_diagnostics: false,
            ..Configuration::default()
        };
        let text = CodeGenerator::new(&ctx, &config)
            .generate(&schema_for("Microsoft.Compute/virtualMachines"))
            .render();
        assert!(!text.contains("diagnosticsProfile"));
    }

    #[test]
    fn test_generic_type_derives_parameters() {
        let ctx = ctx();
        let config = Configuration::default();
        let schema = ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": "Contoso.Widgets/gadgets" },
                "apiVersion": { "enum": ["2023-01-01", "2024-01-01-preview"] },
                "properties": {
                    "type": "object",
                    "properties": {
                        "size": { "type": "integer", "minimum": 1, "maximum": 5 },
                        "apiToken": { "type": "string" },
                        "bad-name": { "type": "string" }
                    }
                }
            }
        }));

        let doc = CodeGenerator::new(&ctx, &config).generate(&schema);
        assert!(doc.has_param("size"));
        assert!(doc.param("apiToken").unwrap().is_secure());
        assert!(!doc.has_param("bad-name"));

        let resource = doc.resource("gadgets").unwrap();
        assert_eq!(resource.api_version, "2023-01-01");
        match resource.body.get("properties") {
            Some(BicepValue::Object(properties)) => {
                assert_eq!(properties.keys(), vec!["size", "apiToken"]);
            }
            other => panic!("unexpected properties: {:?}", other),
        }
    }

    #[test]
    fn test_generic_top_level_properties() {
        let ctx = ctx();
        let config = Configuration::default();
        let schema = ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": "Contoso.Widgets/gadgets" },
                "name": { "type": "string" },
                "sku": { "type": "object" }
            }
        }));

        let doc = CodeGenerator::new(&ctx, &config).generate(&schema);
        assert!(doc.has_param("sku"));
        assert!(!doc.has_param("name"));
        let resource = doc.resource("gadgets").unwrap();
        assert_eq!(resource.body.get("sku"), Some(&BicepValue::expr("sku")));
    }

    #[test]
    fn test_derived_parameters_avoid_declared_names() {
        let ctx = ctx();
        let config = Configuration::default();
        let schema = ResourceSchema::from_value(json!({
            "type": "object",
            "properties": {
                "type": { "const": "Contoso.Widgets/gadgets" },
                "resourceNameFormatted": { "type": "string" },
                "commonTags": { "type": "object" },
                "gadgets": { "type": "string" },
                "size": { "type": "integer" }
            }
        }));

        let doc = CodeGenerator::new(&ctx, &config).generate(&schema);
        assert!(doc.variable("resourceNameFormatted").is_some());
        assert!(!doc.has_param("resourceNameFormatted"));
        assert!(!doc.has_param("commonTags"));
        assert!(!doc.has_param("gadgets"));
        assert!(doc.has_param("size"));

        let text = doc.render();
        assert_eq!(text.matches("resourceNameFormatted =").count(), 1);
        assert!(!text.contains("param commonTags"));
    }

    #[test]
    fn test_outputs_can_be_disabled() {
        let ctx = ctx();
        let config = Configuration {
            include_outputs: false,
            ..Configuration::default()
        };
        let doc = CodeGenerator::new(&ctx, &config).generate(&schema_for("Microsoft.Web/sites"));
        assert!(doc.outputs().is_empty());
        assert!(!doc.render().contains("=== OUTPUTS ==="));
    }

    #[test]
    fn test_template_entry_generation() {
        let ctx = ctx();
        let config = Configuration::default();
        let doc = CodeGenerator::new(&ctx, &config).generate_from_template_entry(&json!({
            "type": "Microsoft.Insights/components",
            "apiVersion": "2020-02-02",
            "name": "appInsights"
        }));
        assert_eq!(doc.resource("components").unwrap().api_version, "2020-02-02");
    }
}
