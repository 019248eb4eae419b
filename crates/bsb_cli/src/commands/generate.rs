//! Generate command - Generate Bicep for one resource schema.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use bsb_core::{GenerationContext, Input};
use bsb_iac::{CodeGenerator, GeneratedDocument};

use super::{load_config, read_input, write_output};

#[derive(Args)]
pub struct GenerateArgs {
    /// Resource schema, or a deployment template whose first resource is used
    schema: PathBuf,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output Bicep file (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write a deployment parameters file
    #[arg(long)]
    parameters_file: Option<PathBuf>,

    /// Target region, overriding the configuration
    #[arg(short, long)]
    location: Option<String>,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(location) = args.location {
        config = config.with_location(location);
    }

    let text = read_input(&args.schema)?;
    let ctx = GenerationContext::new();
    let generator = CodeGenerator::new(&ctx, &config);

    let document = generate(&generator, Input::classify(&text)?)?;
    info!("Generated {} declaration(s)", document.declarations().len());

    write_output(&document.render(), args.out.as_ref())?;

    if let Some(path) = &args.parameters_file {
        let parameters = serde_json::to_string_pretty(&document.parameters_file())?;
        write_output(&format!("{}\n", parameters), Some(path))?;
    }

    Ok(())
}

fn generate(generator: &CodeGenerator<'_>, input: Input) -> Result<GeneratedDocument> {
    match input {
        Input::ResourceSchema(schema) => Ok(generator.generate(&schema)),
        Input::Template(template) => {
            let resources = template.resources().map(Vec::as_slice).unwrap_or_default();
            let Some(first) = resources.first() else {
                anyhow::bail!("Template declares no resources to generate from");
            };
            if resources.len() > 1 {
                warn!(
                    "Template declares {} resources; generating from the first only (use `convert` for VM templates)",
                    resources.len()
                );
            }
            Ok(generator.generate_from_template_entry(first))
        }
        Input::Bicep(_) => anyhow::bail!("Input is already Bicep; expected a JSON schema or template"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsb_core::Configuration;

    #[test]
    fn test_generate_from_template_uses_first_resource() {
        let ctx = GenerationContext::new();
        let config = Configuration::default();
        let generator = CodeGenerator::new(&ctx, &config);

        let input = Input::classify(
            r#"{
                "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
                "resources": [
                    { "type": "Microsoft.Storage/storageAccounts", "apiVersion": "2022-09-01", "name": "st" },
                    { "type": "Microsoft.KeyVault/vaults", "apiVersion": "2022-07-01", "name": "kv" }
                ]
            }"#,
        )
        .unwrap();

        let rendered = generate(&generator, input).unwrap().render();
        assert!(rendered.contains("'Microsoft.Storage/storageAccounts@"));
        assert!(!rendered.contains("Microsoft.KeyVault/vaults"));
    }

    #[test]
    fn test_generate_rejects_bicep_and_empty_templates() {
        let ctx = GenerationContext::new();
        let config = Configuration::default();
        let generator = CodeGenerator::new(&ctx, &config);

        assert!(generate(&generator, Input::Bicep("param x string".to_string())).is_err());

        let empty = Input::classify(
            r#"{ "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#", "resources": [] }"#,
        )
        .unwrap();
        assert!(generate(&generator, empty).is_err());
    }
}
