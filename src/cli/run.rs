//! CLI entry point and dispatch
//!
//! `run()` parses arguments, installs logging, discovers configuration, builds the
//! tokio runtime and dispatches. It prints every error itself; `main` only exits.

use anyhow::Result;
use clap::Parser;

use archsmith_utils::logging::{LogFormat, init_tracing, redact_error_message};

use super::args::{Cli, Commands};
use super::commands;
use crate::{ArchsmithError, CliArgs, Config, ExitCode};

/// Run the CLI to completion.
///
/// Returns `Err(ExitCode)` after the error has been printed to stderr.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    if let Err(e) = init_tracing(cli.verbose, format) {
        eprintln!("warning: logging unavailable: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        provider: cli.provider.clone(),
        dry_run: cli.dry_run,
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = ArchsmithError::from(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();
    let result = rt.block_on(async {
        match cli.command {
            Commands::Chat { out } => commands::execute_chat_command(config, out.as_deref()).await,
            Commands::Generate {
                requirements,
                requirements_file,
                documents,
                out,
                json,
            } => {
                let request = commands::GenerateRequest {
                    requirements,
                    requirements_file,
                    documents,
                    out,
                    json,
                };
                commands::execute_generate_command(config, request).await
            }
            Commands::Config { json } => commands::execute_config_command(&config, json),
        }
    });

    match result {
        Ok(()) => Ok(()),
        Err(error) => Err(report_error(&error, operation)),
    }
}

fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(err) = error.downcast_ref::<ArchsmithError>() {
        eprintln!("{}", redact_error_message(&err.display_for_user()));
        if error.chain().count() > 1 {
            eprintln!("\n  While handling: {}", redact_error_message(&error.to_string()));
        }
        return err.to_exit_code();
    }

    eprintln!(
        "Unexpected error during {operation}: {}",
        redact_error_message(&format!("{error:#}"))
    );
    eprintln!("\n  Run with --verbose for more detail.");
    ExitCode::INTERNAL
}
