//! # bsb_iac
//!
//! Bicep generation for Bicep Schema Builder.
//!
//! Documents are assembled as a structured [`GeneratedDocument`] (parameters,
//! variables, resource and module declarations, outputs) and rendered to text
//! in one final step, so callers can inspect what was generated before
//! writing it anywhere.
//!
//! ## Features
//!
//! - Single-resource generation from a JSON Schema or a template entry
//! - ARM template analysis and VM conversion, with new or existing networks
//! - Multi-resource assembly, inline or as modules, with dependency wiring
//! - Deployment packages with parameters file, README and deploy script
//!
//! ## Example
//!
//! ```rust
//! use bsb_core::{Configuration, GenerationContext, ResourceSchema};
//! use bsb_iac::CodeGenerator;
//! use serde_json::json;
//!
//! let schema = ResourceSchema::from_value(json!({
//!     "type": "object",
//!     "properties": { "type": { "const": "Microsoft.Storage/storageAccounts" } }
//! }));
//! let ctx = GenerationContext::new();
//! let config = Configuration::default();
//!
//! let doc = CodeGenerator::new(&ctx, &config).generate(&schema);
//! assert!(doc.has_param("location"));
//! assert!(doc.render().contains("resource storageAccounts 'Microsoft.Storage/storageAccounts@"));
//! ```

pub mod analyzer;
pub mod assembler;
pub mod bicep;
pub mod converter;
pub mod error;
pub mod generator;
pub mod package;
pub mod rules;

pub use analyzer::{Analysis, MissingDependency, TemplateAnalyzer};
pub use assembler::{
    AssembledResource, Assembler, Assembly, DirectorySchemaSource, ModuleFile, SchemaSource,
};
pub use bicep::{
    BicepType, BicepValue, Body, Declaration, GeneratedDocument, ModuleDecl, Output, Param,
    ResourceDecl, Section, SectionKind, Variable,
};
pub use converter::ArmConverter;
pub use error::{IacError, IacResult};
pub use generator::CodeGenerator;
pub use package::{DeploymentPackage, PackageFile};
