//! Validate command - Validate a schema, template or Bicep file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::{debug, info};

use bsb_core::{DeploymentTemplate, GenerationContext, Input, ResourceSchema};
use bsb_validate::{validate_input, validate_instance, ResourceTypeValidator, ValidationResult};

use super::{read_input, ValidationFailed};

/// How the input file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Detect the dialect from the content
    Auto,
    Resource,
    Template,
    Bicep,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// File to validate
    file: PathBuf,

    /// Dialect of the file
    #[arg(short, long, value_enum, default_value = "auto")]
    mode: Mode,

    /// Check resource types and API versions against the known registry
    #[arg(long)]
    strict_types: bool,

    /// Instance document to check against the schema
    #[arg(long)]
    instance: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating {:?}", args.file);
    let text = read_input(&args.file)?;

    let input = classify(&text, args.mode)?;
    debug!("Classified input as {}", input.dialect());
    let mut result = validate_input(&input);

    if args.strict_types {
        if let Input::ResourceSchema(schema) = &input {
            result.merge(check_resource_type(schema));
        }
    }

    if let Some(instance_path) = &args.instance {
        let Input::ResourceSchema(schema) = &input else {
            anyhow::bail!("--instance requires a resource schema argument");
        };
        let instance: serde_json::Value = serde_json::from_str(&read_input(instance_path)?)
            .with_context(|| format!("Failed to parse instance {}", instance_path.display()))?;
        result.merge(validate_instance(schema, &instance)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&args.file, &result);
    }

    if result.is_valid() {
        Ok(())
    } else {
        Err(ValidationFailed {
            errors: result.errors().len(),
        }
        .into())
    }
}

/// Classify the text, honouring a forced mode.
fn classify(text: &str, mode: Mode) -> Result<Input> {
    let input = match mode {
        Mode::Auto => Input::classify(text)?,
        Mode::Resource => Input::ResourceSchema(ResourceSchema::parse(text)?),
        Mode::Template => Input::Template(DeploymentTemplate::parse(text)?),
        Mode::Bicep => Input::Bicep(text.to_string()),
    };
    Ok(input)
}

fn check_resource_type(schema: &ResourceSchema) -> ValidationResult {
    let mut result = ValidationResult::new();
    let Some(resource_type) = schema.resource_type() else {
        result.add_warning("No resource type declared; type check skipped");
        return result;
    };

    let ctx = GenerationContext::new();
    let check = ResourceTypeValidator::new(&ctx).validate_offline(resource_type, schema);
    if !check.resource_type_valid {
        result.add_error(format!("Unknown resource type: {}", resource_type));
    }
    result.merge(check.to_validation_result());
    result
}

fn print_result(file: &std::path::Path, result: &ValidationResult) {
    let dialect = result.dialect().unwrap_or("unknown");
    println!("📋 Validating {} ({})", file.display(), dialect);

    if result.is_valid() {
        println!("   ✅ Validation passed");
    } else {
        println!("   ❌ Validation failed:");
        for error in result.errors() {
            println!("      - {}", error);
        }
    }

    for warning in result.warnings() {
        println!("   ⚠️  {}", warning);
    }
    for note in result.info() {
        println!("   ℹ️  {}", note);
    }
}
