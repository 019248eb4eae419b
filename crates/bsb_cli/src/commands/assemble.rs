//! Assemble command - Build one deployment from several catalog resources.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use bsb_core::{GenerationContext, ResourceCatalog, SelectedResource};
use bsb_iac::{Assembler, DeploymentPackage, DirectorySchemaSource};

use super::{load_config, read_input};

#[derive(Args)]
pub struct AssembleArgs {
    /// Directory holding `<schema>.json` files for the catalog
    #[arg(short, long)]
    schemas: PathBuf,

    /// Catalog id to include (repeatable)
    #[arg(short, long = "resource", required = true)]
    resources: Vec<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON object mapping catalog ids to property bodies
    #[arg(long)]
    resource_config: Option<PathBuf>,

    /// Generate one module file per resource
    #[arg(long)]
    modules: bool,

    /// Write a deployment package to this directory (prints main.bicep when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

pub async fn execute(args: AssembleArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.modules {
        config = config.with_modules(true);
    }

    let selection = select(&ResourceCatalog::builtin(), &args.resources)?;
    let resource_configs = match &args.resource_config {
        Some(path) => load_resource_configs(path)?,
        None => HashMap::new(),
    };

    let ctx = GenerationContext::new();
    let source = DirectorySchemaSource::new(&args.schemas);
    let assembly = Assembler::new(&ctx, &source, &config)
        .assemble(&selection, &resource_configs)
        .await?;

    for resource in &assembly.resources {
        debug!("{} validated against {} data", resource.resource.id, resource.validation_source);
    }
    eprintln!(
        "🔎 Resource types validated against {} ({})",
        assembly.validation_source().description(),
        assembly.validation_source()
    );
    for warning in &assembly.warnings {
        eprintln!("   ⚠️  {}", warning);
    }

    match &args.out {
        Some(dir) => {
            let package = DeploymentPackage::from_assembly(&assembly)?;
            let written = package.write_to(dir).await?;
            println!("📦 Deployment package written to {}", dir.display());
            for path in written {
                println!("   - {}", path.display());
            }
        }
        None => print!("{}", assembly.document.render()),
    }

    info!("Assembled {} of {} resource(s)", assembly.resources.len(), selection.len());
    Ok(())
}

/// Map ids to catalog entries, keeping the order given and dropping repeats.
fn select(catalog: &ResourceCatalog, ids: &[String]) -> Result<Vec<SelectedResource>> {
    let mut selection: Vec<SelectedResource> = Vec::new();
    for id in ids {
        let Some(resource) = catalog.get(id) else {
            anyhow::bail!(
                "Resource '{}' not found in catalog (available: {})",
                id,
                catalog.ids().join(", ")
            );
        };
        if !selection.iter().any(|r| r.id == resource.id) {
            selection.push(resource.clone());
        }
    }
    Ok(selection)
}

fn load_resource_configs(path: &std::path::Path) -> Result<HashMap<String, Value>> {
    serde_json::from_str(&read_input(path)?)
        .with_context(|| format!("Resource configuration must be a JSON object: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_select_preserves_order_and_dedups() {
        let catalog = ResourceCatalog::builtin();
        let ids = vec!["webapp".to_string(), "appplan".to_string(), "webapp".to_string()];
        let selection = select(&catalog, &ids).unwrap();

        let picked: Vec<&str> = selection.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(picked, vec!["webapp", "appplan"]);
        assert_eq!(selection[1].schema, "app-service-plan");
    }

    #[test]
    fn test_select_unknown_id() {
        let err = select(&ResourceCatalog::builtin(), &["cosmos".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_resource_configs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs.json");
        std::fs::write(&path, r#"{ "storage": { "accessTier": "Cool" } }"#).unwrap();

        let configs = load_resource_configs(&path).unwrap();
        assert_eq!(configs["storage"]["accessTier"], "Cool");

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load_resource_configs(&path).is_err());
    }

    #[tokio::test]
    async fn test_assemble_writes_package() {
        let schemas = tempdir().unwrap();
        std::fs::write(
            schemas.path().join("storage-account.json"),
            r#"{
                "type": "object",
                "properties": {
                    "type": { "const": "Microsoft.Storage/storageAccounts" },
                    "apiVersion": { "enum": ["2022-09-01"] }
                }
            }"#,
        )
        .unwrap();
        let out = tempdir().unwrap();

        execute(AssembleArgs {
            schemas: schemas.path().to_path_buf(),
            resources: vec!["storage".to_string()],
            config: None,
            resource_config: None,
            modules: false,
            out: Some(out.path().to_path_buf()),
        })
        .await
        .unwrap();

        let main = std::fs::read_to_string(out.path().join("main.bicep")).unwrap();
        assert!(main.contains("Microsoft.Storage/storageAccounts@2022-05-01"));
        assert!(out.path().join("README.md").exists());
        assert!(out.path().join("deploy.ps1").exists());
    }
}
