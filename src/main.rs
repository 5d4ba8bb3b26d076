use clap::Parser;
use colored::*;
use depgate::cli::args::{Cli, ColorMode, Commands, EXIT_ERROR};
use depgate::cli::commands::{cmd_cache, cmd_config, cmd_evaluate, EvaluateOpts};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    // Initialize structured logging before any command runs.
    // log_level/log_format are consumed here; only command is forwarded.
    if let Err(e) = depgate::logging::init(cli.log_level.into(), cli.log_format) {
        eprintln!("{}: Failed to initialize logging: {}", "Error".red().bold(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    match run(cli.command) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Evaluate {
            artifact,
            report,
            config,
            store,
            organization,
            module,
            revision,
            format,
            quiet,
        } => cmd_evaluate(EvaluateOpts {
            artifact,
            report,
            config,
            store,
            organization,
            module,
            revision,
            format,
            quiet,
        }),
        Commands::Cache { action } => cmd_cache(action),
        Commands::Config { action } => cmd_config(action),
    }
}
