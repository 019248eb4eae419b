//! Bicep Schema Builder CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template or input error
//! - 5: IaC generation error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, ValidationFailed};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const IAC_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "bsb=debug,info"
    } else if cli.quiet {
        "warn"
    } else {
        "bsb=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Convert(args) => commands::convert::execute(args).await,
        Commands::Assemble(args) => commands::assemble::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ValidationFailed>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }
    if let Some(core) = e.downcast_ref::<bsb_core::CoreError>() {
        return core_exit_code(core);
    }
    if e.downcast_ref::<bsb_validate::ValidateError>().is_some() {
        return ExitCodes::TEMPLATE_ERROR;
    }
    if let Some(iac) = e.downcast_ref::<bsb_iac::IacError>() {
        return match iac {
            bsb_iac::IacError::Core(core) => core_exit_code(core),
            bsb_iac::IacError::EmptySelection => ExitCodes::INVALID_ARGS,
            _ => ExitCodes::IAC_ERROR,
        };
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn core_exit_code(e: &bsb_core::CoreError) -> u8 {
    match e {
        bsb_core::CoreError::Parse(_) | bsb_core::CoreError::UnrecognizedInput(_) => ExitCodes::TEMPLATE_ERROR,
        bsb_core::CoreError::MissingConfiguration { .. } | bsb_core::CoreError::InvalidConfiguration(_) => {
            ExitCodes::INVALID_ARGS
        }
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_errors() {
        let failed = anyhow::Error::new(ValidationFailed { errors: 2 });
        assert_eq!(categorize_error(&failed), ExitCodes::VALIDATION_FAILURE);

        let parse = bsb_core::Input::classify("{ broken").unwrap_err();
        assert_eq!(categorize_error(&anyhow::Error::new(parse)), ExitCodes::TEMPLATE_ERROR);

        let missing = bsb_iac::IacError::Core(bsb_core::CoreError::MissingConfiguration {
            fields: vec!["existingVnetName".to_string()],
        });
        assert_eq!(categorize_error(&anyhow::Error::new(missing)), ExitCodes::INVALID_ARGS);

        let analysis = anyhow::Error::new(bsb_iac::IacError::NotAnalyzed);
        assert_eq!(categorize_error(&analysis), ExitCodes::IAC_ERROR);

        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }
}
