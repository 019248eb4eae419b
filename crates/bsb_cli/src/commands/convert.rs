//! Convert command - Convert an ARM virtual machine template to Bicep.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::info;

use bsb_core::{Configuration, DeploymentTemplate, GenerationContext, NetworkMode, OsType};
use bsb_iac::ArmConverter;

use super::{load_config, read_input, write_output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkModeArg {
    /// Create a virtual network, subnet and security group
    CreateNew,
    /// Attach to an existing virtual network and subnet
    Existing,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// ARM deployment template to convert
    template: PathBuf,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network provisioning mode, overriding the configuration
    #[arg(long, value_enum)]
    network_mode: Option<NetworkModeArg>,

    /// Existing virtual network name
    #[arg(long)]
    vnet: Option<String>,

    /// Existing subnet name
    #[arg(long)]
    subnet: Option<String>,

    /// Operating system of the virtual machine (Windows or Linux)
    #[arg(long)]
    os: Option<OsType>,

    /// Output Bicep file (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

pub async fn execute(args: ConvertArgs) -> Result<()> {
    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    let template = DeploymentTemplate::parse(&read_input(&args.template)?)?;

    let ctx = GenerationContext::new();
    let mut converter = ArmConverter::new(&ctx, &config);

    let analysis = converter.analyze(&template);
    for line in analysis.summary() {
        info!("{}", line);
    }
    for dependency in &analysis.missing_dependencies {
        if !dependency.present_in_template {
            eprintln!("   ⚠️  {} will be generated: {}", dependency.resource_type, dependency.reason);
        }
    }

    let document = converter.convert()?;
    write_output(&document.render(), args.out.as_ref())?;

    Ok(())
}

fn apply_overrides(mut config: Configuration, args: &ConvertArgs) -> Configuration {
    if let Some(mode) = args.network_mode {
        config.network_mode = match mode {
            NetworkModeArg::CreateNew => NetworkMode::CreateNew,
            NetworkModeArg::Existing => NetworkMode::UseExisting,
        };
    }
    if let Some(vnet) = &args.vnet {
        config.existing_vnet_name = Some(vnet.clone());
    }
    if let Some(subnet) = &args.subnet {
        config.existing_subnet_name = Some(subnet.clone());
    }
    if let Some(os) = args.os {
        config.os_type = os;
    }
    config
}
