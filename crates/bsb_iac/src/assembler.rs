//! Multi-resource deployment assembly.
//!
//! The assembler loads one schema per selected resource, checks it against
//! the registry, and wires the resources into a single deployment: either
//! inline resource blocks or one module file per resource. Schemas load one
//! at a time; a resource whose schema cannot be loaded is reported and left
//! out while the rest of the batch proceeds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use bsb_core::{
    Configuration, GenerationContext, ResourceKind, ResourceSchema, SelectedResource, TargetScope,
    NESTED_DEPLOYMENT_TYPE,
};
use bsb_validate::{ResourceTypeValidator, ValidationSource};

use crate::bicep::{
    BicepType, BicepValue, Body, GeneratedDocument, ModuleDecl, Output, Param, ResourceDecl,
    Variable,
};
use crate::error::{IacError, IacResult};
use crate::rules::{self, GENERATOR_NAME, IDENTITY_FIELDS};

/// Supplies resource schemas by name.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn load(&self, name: &str) -> IacResult<ResourceSchema>;
}

/// Schemas stored as `<name>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    /// Names of the schemas in the directory, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .filter_map(|e| e.path().file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl SchemaSource for DirectorySchemaSource {
    async fn load(&self, name: &str) -> IacResult<ResourceSchema> {
        let path = self.path_for(name);
        debug!("Loading schema {:?}", path);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| IacError::schema_source(name, e))?;
        ResourceSchema::parse(&content).map_err(|e| IacError::schema_source(name, e))
    }
}

/// Resources each catalog id depends on when both are selected.
const DEPENDENCIES: [(&str, &[&str]); 4] = [
    ("webapp", &["appplan"]),
    ("functions", &["appplan", "storage"]),
    ("sqldatabase", &["storage"]),
    ("vm", &["vnet"]),
];

/// Catalog ids `id` depends on.
pub fn dependencies_of(id: &str) -> &'static [&'static str] {
    DEPENDENCIES
        .iter()
        .find(|(resource, _)| *resource == id)
        .map(|(_, deps)| *deps)
        .unwrap_or(&[])
}

/// Bicep symbol for a catalog id.
pub fn symbol_for(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn module_symbol(resource: &AssembledResource) -> String {
    format!("{}Module", resource.symbol)
}

/// A selected resource whose schema loaded.
#[derive(Debug, Clone)]
pub struct AssembledResource {
    pub resource: SelectedResource,
    pub resource_type: String,
    pub api_version: String,
    pub symbol: String,
    pub schema: ResourceSchema,
    /// Whether the type check used live metadata or the registry.
    pub validation_source: ValidationSource,
}

/// One generated module file.
#[derive(Debug, Clone)]
pub struct ModuleFile {
    pub id: String,
    /// Path relative to the main document, such as `modules/storage.bicep`.
    pub path: String,
    pub document: GeneratedDocument,
}

/// Output of [`Assembler::assemble`].
#[derive(Debug, Clone)]
pub struct Assembly {
    pub document: GeneratedDocument,
    pub modules: Vec<ModuleFile>,
    pub warnings: Vec<String>,
    pub resources: Vec<AssembledResource>,
    include_parameters: bool,
}

impl Assembly {
    /// Companion parameters document, when parameters are included.
    pub fn parameters_file(&self) -> Option<Value> {
        self.include_parameters.then(|| self.document.parameters_file())
    }

    pub fn is_included(&self, id: &str) -> bool {
        self.resources.iter().any(|r| r.resource.id == id)
    }

    /// `Live` only when every included resource was checked live.
    pub fn validation_source(&self) -> ValidationSource {
        if !self.resources.is_empty()
            && self
                .resources
                .iter()
                .all(|r| r.validation_source == ValidationSource::Live)
        {
            ValidationSource::Live
        } else {
            ValidationSource::Offline
        }
    }
}

/// Builds one deployment from several selected resources.
pub struct Assembler<'a> {
    ctx: &'a GenerationContext,
    source: &'a dyn SchemaSource,
    config: &'a Configuration,
}

impl<'a> Assembler<'a> {
    pub fn new(ctx: &'a GenerationContext, source: &'a dyn SchemaSource, config: &'a Configuration) -> Self {
        Self { ctx, source, config }
    }

    /// Assemble the selection. `resource_configs` maps catalog ids to a
    /// JSON object used as that resource's `properties` body.
    pub async fn assemble(
        &self,
        selection: &[SelectedResource],
        resource_configs: &HashMap<String, Value>,
    ) -> IacResult<Assembly> {
        if selection.is_empty() {
            return Err(IacError::EmptySelection);
        }
        info!("Assembling {} resources", selection.len());

        let mut warnings = Vec::new();
        let mut resources = Vec::new();
        for selected in selection {
            match self.source.load(&selected.schema).await {
                Ok(schema) => resources.push(self.check(selected, schema, &mut warnings).await),
                Err(e) => {
                    warn!("Failed to load schema for {}: {}", selected.name, e);
                    warnings.push(format!("{}: Failed to load schema", selected.name));
                }
            }
        }

        let names: Vec<&str> = selection.iter().map(|r| r.name.as_str()).collect();
        let mut builder = GeneratedDocument::builder(TargetScope::ResourceGroup)
            .header_line("Multi-Resource Azure Deployment Template")
            .header_line(format!("Generated by {}", GENERATOR_NAME))
            .header_line(format!("Resources: {}", names.join(", ")))
            .header_line(format!("Generated on: {}", self.ctx.clock().timestamp()));
        if !warnings.is_empty() {
            builder = builder.notes("Validation Warnings:", warnings.clone());
        }
        builder = builder.params(self.common_parameters());

        let mut modules = Vec::new();
        if self.config.generate_modules {
            for resource in &resources {
                let path = format!("modules/{}.bicep", resource.resource.id);
                builder = builder.module(self.module_declaration(resource, &path, &resources));
                modules.push(ModuleFile {
                    id: resource.resource.id.clone(),
                    path,
                    document: self.module_document(resource, resource_configs),
                });
            }
        } else {
            if resources.iter().any(|r| self.supports_location_and_tags(r)) {
                builder = builder.variable(common_tags());
            }
            for resource in &resources {
                builder = builder.params(self.generic_parameters(resource).into_iter().map(|(_, p)| p));
                builder = builder.resource(self.inline_resource(resource, &resources, resource_configs));
            }
        }

        if self.config.include_outputs {
            for resource in &resources {
                let symbol = &resource.symbol;
                let (id_value, name_value) = if self.config.generate_modules {
                    (
                        format!("{}.outputs.resourceId", module_symbol(resource)),
                        format!("{}.outputs.resourceName", module_symbol(resource)),
                    )
                } else {
                    (format!("{}.id", resource.symbol), format!("{}.name", resource.symbol))
                };
                builder = builder
                    .output(Output::new(format!("{}Id", symbol), BicepType::String, BicepValue::expr(id_value)))
                    .output(Output::new(format!("{}Name", symbol), BicepType::String, BicepValue::expr(name_value)));
            }
        }

        info!(
            "Assembled {} of {} resources with {} warnings",
            resources.len(),
            selection.len(),
            warnings.len()
        );
        Ok(Assembly {
            document: builder.build(),
            modules,
            warnings,
            resources,
            include_parameters: self.config.include_parameters,
        })
    }

    /// Type check against live metadata when an authenticated provider is
    /// available, otherwise against the registry. Unknown API versions are
    /// replaced by the newest known one.
    async fn check(
        &self,
        selected: &SelectedResource,
        mut schema: ResourceSchema,
        warnings: &mut Vec<String>,
    ) -> AssembledResource {
        let resource_type = schema.resource_type().unwrap_or(NESTED_DEPLOYMENT_TYPE).to_string();
        let validator = ResourceTypeValidator::new(self.ctx);
        let validation = match self.ctx.live_metadata() {
            Some(_) => validator.validate(&resource_type, &schema).await,
            None => validator.validate_offline(&resource_type, &schema),
        };
        debug!("{} checked against {} data", selected.id, validation.source);
        warnings.extend(validation.notes.iter().map(|note| format!("{}: {}", selected.name, note)));

        if !validation.resource_type_valid {
            warnings.push(format!("{}: Resource type may not be valid", selected.name));
        }
        let invalid = validation.invalid_api_versions();
        if !invalid.is_empty() {
            warnings.push(format!("{}: API versions {} may be invalid", selected.name, invalid.join(", ")));
            if let Some(latest) = validation.latest_available() {
                if schema.set_api_versions(vec![latest.to_string()]) {
                    warnings.push(format!("{}: Auto-corrected to use API version {}", selected.name, latest));
                }
            }
        }

        let api_version = self.ctx.registry().select_api_version(&schema, &resource_type);
        debug!("{} resolved to {}@{}", selected.id, resource_type, api_version);
        AssembledResource {
            resource: selected.clone(),
            resource_type,
            api_version,
            symbol: symbol_for(&selected.id),
            schema,
            validation_source: validation.source,
        }
    }

    fn supports_location_and_tags(&self, resource: &AssembledResource) -> bool {
        self.ctx
            .registry()
            .lookup_scoped(&resource.resource_type, TargetScope::ResourceGroup)
            .supports_location_and_tags
    }

    fn common_parameters(&self) -> Vec<Param> {
        let location = match self.config.location.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(location) => BicepValue::str(location),
            None => BicepValue::expr("resourceGroup().location"),
        };
        vec![
            Param::new("location", BicepType::String)
                .describe("The location for all resources")
                .default_value(location),
            Param::new("environment", BicepType::String)
                .describe("Environment name (e.g., dev, test, prod)")
                .default_value(BicepValue::str(self.config.environment.as_str())),
            Param::new("resourcePrefix", BicepType::String)
                .describe("Common resource prefix")
                .default_value(BicepValue::str(self.config.resource_prefix.as_str())),
        ]
    }

    /// Selected dependencies of `resource` that made it into the batch.
    fn included_dependencies<'r>(
        &self,
        resource: &AssembledResource,
        resources: &'r [AssembledResource],
    ) -> Vec<&'r AssembledResource> {
        if !self.config.include_dependencies {
            return Vec::new();
        }
        dependencies_of(&resource.resource.id)
            .iter()
            .filter_map(|dep| resources.iter().find(|r| r.resource.id == *dep))
            .collect()
    }

    fn inline_resource(
        &self,
        resource: &AssembledResource,
        resources: &[AssembledResource],
        resource_configs: &HashMap<String, Value>,
    ) -> ResourceDecl {
        let supports = self.supports_location_and_tags(resource);
        let mut body = Body::new()
            .prop("name", resource_name(&resource.resource.id))
            .prop_if(supports, "location", BicepValue::expr("location"))
            .prop_if(supports, "tags", BicepValue::expr("commonTags"));

        for (property, param) in self.generic_parameters(resource) {
            body = body.prop(property, BicepValue::expr(param.name));
        }

        body = self.append_properties(body, resource, resources, resource_configs);

        let dependencies = self.included_dependencies(resource, resources);
        if !dependencies.is_empty() {
            body = body.prop(
                "dependsOn",
                BicepValue::Array(dependencies.iter().map(|d| BicepValue::expr(d.symbol.as_str())).collect()),
            );
        }

        ResourceDecl::new(&resource.symbol, &resource.resource_type, &resource.api_version).with_body(body)
    }

    fn module_declaration(
        &self,
        resource: &AssembledResource,
        path: &str,
        resources: &[AssembledResource],
    ) -> ModuleDecl {
        let id = &resource.resource.id;
        let mut body = Body::new()
            .prop("name", BicepValue::str(format!("{}-deployment", id)))
            .prop(
                "params",
                Body::new()
                    .prop("location", BicepValue::expr("location"))
                    .prop("environment", BicepValue::expr("environment"))
                    .prop("resourcePrefix", BicepValue::expr("resourcePrefix")),
            );
        let dependencies = self.included_dependencies(resource, resources);
        if !dependencies.is_empty() {
            body = body.prop(
                "dependsOn",
                BicepValue::Array(
                    dependencies
                        .iter()
                        .map(|d| BicepValue::expr(module_symbol(d)))
                        .collect(),
                ),
            );
        }
        ModuleDecl::new(module_symbol(resource), path, body)
    }

    /// Standalone document for one module file.
    fn module_document(
        &self,
        resource: &AssembledResource,
        resource_configs: &HashMap<String, Value>,
    ) -> GeneratedDocument {
        let supports = self.supports_location_and_tags(resource);
        let body = Body::new()
            .prop("name", resource_name(&resource.resource.id))
            .prop_if(supports, "location", BicepValue::expr("location"));
        let body = self.append_properties(body, resource, &[], resource_configs);

        GeneratedDocument::builder(TargetScope::ResourceGroup)
            .header_line(format!("{} module", resource.resource.id))
            .param(Param::new("location", BicepType::String).describe("The location for the resource"))
            .param(Param::new("environment", BicepType::String).describe("Environment name"))
            .param(Param::new("resourcePrefix", BicepType::String).describe("Resource prefix"))
            .resource(ResourceDecl::new(&resource.symbol, &resource.resource_type, &resource.api_version).with_body(body))
            .outputs(rules::base_outputs(&resource.symbol, false))
            .build()
    }

    /// `<id>_<property>` parameters, keyed by property, for the top-level
    /// schema properties of a resource without a dedicated table.
    fn generic_parameters(&self, resource: &AssembledResource) -> Vec<(String, Param)> {
        if !self.config.include_parameters || self.kind(resource) != ResourceKind::Generic {
            return Vec::new();
        }
        let Some(properties) = resource.schema.properties() else {
            return Vec::new();
        };
        properties
            .iter()
            .filter(|(name, schema)| schema.is_object() && !IDENTITY_FIELDS.contains(&name.as_str()))
            .filter_map(|(name, schema)| {
                let param_name = format!("{}_{}", resource.resource.id, name);
                if !rules::is_identifier(&param_name) {
                    return None;
                }
                // Sensitivity follows the property name, not the id prefix.
                let mut param = rules::parameter_from_schema(name, schema);
                param.name = param_name;
                Some((name.clone(), param))
            })
            .collect()
    }

    fn kind(&self, resource: &AssembledResource) -> ResourceKind {
        self.ctx.registry().lookup(&resource.resource_type).kind
    }

    /// The configured `properties` object when one was supplied, otherwise
    /// the type's default body.
    fn append_properties(
        &self,
        body: Body,
        resource: &AssembledResource,
        resources: &[AssembledResource],
        resource_configs: &HashMap<String, Value>,
    ) -> Body {
        let configured = resource_configs
            .get(&resource.resource.id)
            .filter(|c| c.as_object().map(|o| !o.is_empty()).unwrap_or(false));
        if let Some(config) = configured {
            debug!("Using configured properties for {}", resource.resource.id);
            return body.prop("properties", BicepValue::from_json(config));
        }

        let config = self.config;
        match self.kind(resource) {
            ResourceKind::VirtualNetwork => body.prop(
                "properties",
                Body::new()
                    .prop(
                        "addressSpace",
                        Body::new().prop("addressPrefixes", BicepValue::strings([config.vnet_address_space.as_str()])),
                    )
                    .prop(
                        "subnets",
                        BicepValue::Array(vec![Body::new()
                            .prop("name", BicepValue::str("default"))
                            .prop(
                                "properties",
                                Body::new().prop("addressPrefix", BicepValue::str(config.subnet_address_space.as_str())),
                            )
                            .into()]),
                    ),
            ),
            ResourceKind::StorageAccount => body
                .prop("sku", Body::new().prop("name", BicepValue::str("Standard_LRS")))
                .prop("kind", BicepValue::str("StorageV2"))
                .prop(
                    "properties",
                    Body::new()
                        .prop("accessTier", BicepValue::str("Hot"))
                        .prop("allowBlobPublicAccess", false)
                        .prop("supportsHttpsTrafficOnly", true)
                        .prop("minimumTlsVersion", BicepValue::str("TLS1_2")),
                ),
            ResourceKind::WebSite => {
                let plan = resources.iter().find(|r| r.resource.id == "appplan");
                body.prop(
                    "properties",
                    Body::new()
                        .prop_if(
                            plan.is_some(),
                            "serverFarmId",
                            BicepValue::expr(plan.map(|p| format!("{}.id", p.symbol)).unwrap_or_default()),
                        )
                        .prop("httpsOnly", true)
                        .prop("siteConfig", Body::new().prop("minTlsVersion", BicepValue::str("1.2"))),
                )
            }
            ResourceKind::NestedDeployment => body.prop("properties", rules::nested_deployment_properties()),
            ResourceKind::VirtualMachine | ResourceKind::Generic => body.prop(
                "properties",
                Body::new().comment("Configure properties based on your requirements"),
            ),
        }
    }
}

/// `'${resourcePrefix}-<id>-${environment}'`
fn resource_name(id: &str) -> BicepValue {
    BicepValue::interp(format!("${{resourcePrefix}}-{}-${{environment}}", id))
}

fn common_tags() -> Variable {
    Variable::new(
        "commonTags",
        Body::new()
            .prop("environment", BicepValue::expr("environment"))
            .prop("resourcePrefix", BicepValue::expr("resourcePrefix"))
            .prop("generatedBy", BicepValue::str(GENERATOR_NAME)),
    )
}
