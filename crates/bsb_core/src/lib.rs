//! # bsb_core
//!
//! Core data model for Bicep Schema Builder.
//!
//! This crate holds the documents the tool reads (resource schemas and
//! deployment templates), the resource type registry that drives generation,
//! user configuration, and the context object that carries the clock and
//! the optional live metadata provider into the validators and generator.
//!
//! ## Example
//!
//! ```rust
//! use bsb_core::{GenerationContext, ResourceSchema};
//! use serde_json::json;
//!
//! let ctx = GenerationContext::new();
//! let schema = ResourceSchema::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "type": { "const": "Microsoft.Storage/storageAccounts" },
//!         "apiVersion": { "enum": ["2021-04-01", "2022-05-01"] }
//!     }
//! }));
//!
//! let version = ctx
//!     .registry()
//!     .select_api_version(&schema, "Microsoft.Storage/storageAccounts");
//! assert_eq!(version, "2022-05-01");
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod metadata;
pub mod registry;

pub use catalog::{ResourceCatalog, SelectedResource};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Configuration, NetworkMode, OsType, DEFAULT_LOCATION};
pub use context::GenerationContext;
pub use document::{
    is_template, DeploymentTemplate, Dialect, Input, ResourceSchema, DEPLOYMENT_PARAMETERS_SCHEMA,
    DEPLOYMENT_TEMPLATE_MARKER, DEPLOYMENT_TEMPLATE_SCHEMA, NESTED_DEPLOYMENT_TYPE,
};
pub use error::{CoreError, CoreResult};
pub use metadata::{CachedTypeInfo, CloudMetadataProvider, ResourceTypeCache};
pub use registry::{
    ResourceKind, ResourceTypeInfo, ResourceTypeRegistry, TargetScope, FALLBACK_API_VERSION,
    NETWORK_INTERFACE_TYPE, STORAGE_ACCOUNT_TYPE, VIRTUAL_MACHINE_TYPE, VIRTUAL_NETWORK_TYPE,
    WEB_SITE_TYPE,
};
