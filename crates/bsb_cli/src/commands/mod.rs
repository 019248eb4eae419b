//! CLI command definitions.
//!
//! This module defines the command structure for the Bicep Schema Builder
//! CLI. Each subcommand maps to one pipeline of the builder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, info};

use bsb_core::Configuration;

pub mod assemble;
pub mod convert;
pub mod generate;
pub mod validate;

/// Bicep Schema Builder - Azure schemas, ARM templates and Bicep
#[derive(Parser)]
#[command(name = "bsb")]
#[command(version, about = "Bicep Schema Builder - validate Azure schemas and generate Bicep")]
#[command(long_about = r#"
Bicep Schema Builder validates Azure resource schemas, ARM deployment
templates and Bicep code, and generates Bicep from schemas and templates.

COMMANDS:
  validate  → Validate a resource schema, ARM template or Bicep file
  generate  → Generate Bicep for one resource schema
  convert   → Convert an ARM virtual machine template to Bicep
  assemble  → Assemble several catalog resources into one deployment

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template or input error
  5 - IaC generation error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a schema, template or Bicep file
    Validate(validate::ValidateArgs),

    /// Generate Bicep from a resource schema
    Generate(generate::GenerateArgs),

    /// Convert an ARM template to Bicep
    Convert(convert::ConvertArgs),

    /// Assemble a multi-resource deployment
    Assemble(assemble::AssembleArgs),
}

/// Raised when a validated document has errors.
#[derive(Debug, Error)]
#[error("Validation failed with {errors} error(s)")]
pub struct ValidationFailed {
    pub errors: usize,
}

/// Load the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<Configuration> {
    match path {
        Some(path) => {
            info!("Using configuration {:?}", path);
            Configuration::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(Configuration::default()),
    }
}

pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Input file not found: {}", path.display()))
}

/// Write `contents` to `out`, or print it when no path is given.
pub fn write_output(contents: &str, out: Option<&PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {} bytes to {:?}", contents.len(), path);
            println!("Wrote {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["bsb", "validate", "schema.json", "--mode", "resource", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate(_)));

        let cli = Cli::try_parse_from([
            "bsb", "convert", "vm.json", "--network-mode", "existing", "--vnet", "hub", "--subnet", "apps",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Convert(_)));

        let cli = Cli::try_parse_from([
            "bsb", "-v", "assemble", "--schemas", "schemas", "--resource", "storage", "--resource", "webapp",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Assemble(_)));

        assert!(Cli::try_parse_from(["bsb", "validate", "x.json", "--mode", "xml"]).is_err());
    }

    #[test]
    fn test_load_config_from_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bsb.yaml");
        std::fs::write(&path, "location: westeurope\nincludeNSG: false\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.location.as_deref(), Some("westeurope"));
        assert!(!config.include_nsg);
        assert_eq!(load_config(None).unwrap(), Configuration::default());
    }

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("main.bicep");
        write_output("targetScope = 'resourceGroup'\n", Some(&path)).unwrap();
        assert!(path.exists());
    }
}
