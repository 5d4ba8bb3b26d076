//! Evaluate command: run the gate for one artifact and enforce the verdict
//! through the exit code.

use anyhow::Context;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::cache::FileStore;
use crate::cli::args::{default_store_path, OutputFormat, EXIT_ALLOW, EXIT_DENY, EXIT_ERROR};
use crate::config::settings::Config;
use crate::gate::pipeline::{Gate, Outcome};
use crate::logging::audit;
use crate::scan::{ArtifactLayout, LayoutInspector, ReportScanner, ScannerRegistry};

/// Arguments of the `evaluate` subcommand.
pub struct EvaluateOpts {
    pub artifact: String,
    pub report: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub organization: Option<String>,
    pub module: Option<String>,
    pub revision: Option<String>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Layout derivation for CLI-supplied artifacts: explicit flags win, the
/// file name fills the rest.
struct CliLayout {
    organization: Option<String>,
    module: Option<String>,
    revision: Option<String>,
}

impl LayoutInspector for CliLayout {
    fn layout_of(&self, artifact: &str) -> Option<ArtifactLayout> {
        ArtifactLayout::derive(
            artifact,
            self.organization.as_deref(),
            self.module.as_deref(),
            self.revision.as_deref(),
        )
    }
}

pub fn cmd_evaluate(opts: EvaluateOpts) -> anyhow::Result<ExitCode> {
    let _span = info_span!("evaluate", artifact = %opts.artifact).entered();

    let config = Config::load_or_default(opts.config.as_deref())
        .context("failed to load configuration")?;

    let store_root = opts.store.unwrap_or_else(default_store_path);
    let store = FileStore::new(store_root.clone()).with_context(|| {
        format!("failed to open property store at '{}'", store_root.display())
    })?;

    let scanners = match &opts.report {
        Some(report_path) => {
            let scanner = ReportScanner::from_file(report_path).with_context(|| {
                format!("failed to load scan report '{}'", report_path.display())
            })?;
            debug!(
                report = %report_path.display(),
                artifacts = scanner.len(),
                "scan report loaded"
            );
            ScannerRegistry::with_all(Arc::new(scanner))
        }
        // No report means the scan service is unreachable; the configured
        // fail policy decides what happens on a cache miss.
        None => ScannerRegistry::new(),
    };

    let inspector = Box::new(CliLayout {
        organization: opts.organization,
        module: opts.module,
        revision: opts.revision,
    });

    let gate = Gate::new(&config, Arc::new(store), scanners, inspector);

    let start = Instant::now();
    let outcome = gate.evaluate(&opts.artifact);
    info!(
        artifact = %opts.artifact,
        status = outcome.http_status(),
        duration_ms = start.elapsed().as_millis() as u64,
        "evaluation complete"
    );

    let event = match &outcome {
        Outcome::Allow => "allow",
        Outcome::Deny { .. } => "deny",
        Outcome::Error { .. } => "error",
    };
    audit::record_event(
        &config.audit,
        event,
        &opts.artifact,
        outcome.reason().unwrap_or(""),
    );

    if !opts.quiet {
        print_outcome(&opts.artifact, &outcome, opts.format);
    }

    Ok(ExitCode::from(match outcome {
        Outcome::Allow => EXIT_ALLOW,
        Outcome::Deny { .. } => EXIT_DENY,
        Outcome::Error { .. } => EXIT_ERROR,
    }))
}

fn print_outcome(artifact: &str, outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Text => match outcome {
            Outcome::Allow => {
                println!("{} download allowed: {}", "✓".green(), artifact);
            }
            Outcome::Deny { reason } => {
                println!("{} download blocked: {}", "✗".red().bold(), reason);
            }
            Outcome::Error { reason } => {
                println!("{} evaluation failed: {}", "!".red().bold(), reason);
            }
        },
        OutputFormat::Json => {
            let json = serde_json::json!({
                "artifact": artifact,
                "outcome": match outcome {
                    Outcome::Allow => "allow",
                    Outcome::Deny { .. } => "deny",
                    Outcome::Error { .. } => "error",
                },
                "http_status": outcome.http_status(),
                "reason": outcome.reason(),
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
    }
}
