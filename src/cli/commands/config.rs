//! Config command: initialize and display gate configuration.

use anyhow::Context;
use std::process::ExitCode;
use tracing::debug;

use crate::cli::args::ConfigAction;
use crate::config::settings::Config;

/// Execute the `config` subcommand (init, show).
pub fn cmd_config(action: ConfigAction) -> anyhow::Result<ExitCode> {
    match action {
        ConfigAction::Init { path } => {
            let config_path = path.unwrap_or_else(Config::default_config_path);
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create config directory '{}'", parent.display())
                })?;
            }

            let toml = Config::default()
                .to_toml()
                .context("failed to serialize default config")?;
            std::fs::write(&config_path, toml).with_context(|| {
                format!("failed to write config file '{}'", config_path.display())
            })?;

            debug!(path = %config_path.display(), "config file created");
            println!("Created config at: {}", config_path.display());
            println!("Default thresholds block any vulnerability or license issue.");
            Ok(ExitCode::SUCCESS)
        }
        ConfigAction::Show => {
            let config_path = Config::default_config_path();
            if !config_path.exists() {
                println!("No config file found at: {}", config_path.display());
                println!("Run 'depgate config init' to create one. Built-in defaults:");
                println!();
                let defaults = Config::default()
                    .to_toml()
                    .context("failed to serialize config")?;
                println!("{defaults}");
                return Ok(ExitCode::SUCCESS);
            }

            // Loading validates the thresholds, so an unrecognized severity
            // surfaces here instead of on the next gate evaluation.
            let config = Config::from_file(&config_path).with_context(|| {
                format!("failed to load config file '{}'", config_path.display())
            })?;
            println!("# {}", config_path.display());
            let effective = config.to_toml().context("failed to serialize config")?;
            println!("{effective}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
