//! Cache command: inspect cached decisions and manage force-download
//! overrides.

use anyhow::Context;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{DecisionCache, FileStore};
use crate::cli::args::{default_store_path, CacheAction, OverrideKind};
use crate::config::settings::Config;
use crate::gate::issue::IssueKind;
use crate::logging::audit;

pub fn cmd_cache(action: CacheAction) -> anyhow::Result<ExitCode> {
    match action {
        CacheAction::Show { artifact, store } => {
            let cache = open_cache(store)?;
            let decision = cache.read(&artifact);
            if decision.is_empty() {
                println!("No cached decision for: {artifact}");
                return Ok(ExitCode::SUCCESS);
            }

            println!("Artifact:        {artifact}");
            println!(
                "Vulnerabilities: {}",
                decision.vulnerability_summary.as_deref().unwrap_or("(not scanned)")
            );
            println!(
                "Licenses:        {}",
                decision.license_summary.as_deref().unwrap_or("(not scanned)")
            );
            if let Some(url) = &decision.issue_url {
                println!("Reference URL:   {url}");
            }
            print_override(
                "vulnerabilities",
                decision.vulnerabilities_force_download.enabled,
                decision.vulnerabilities_force_download.justification.as_deref(),
            );
            print_override(
                "licenses",
                decision.licenses_force_download.enabled,
                decision.licenses_force_download.justification.as_deref(),
            );
            Ok(ExitCode::SUCCESS)
        }

        CacheAction::Clear { artifact, store } => {
            let cache = open_cache(store)?;
            cache.clear(&artifact);
            debug!(artifact = artifact.as_str(), "cached decision cleared");
            println!("Cleared cached decision for: {artifact}");
            println!("The artifact will be rescanned on its next request.");
            Ok(ExitCode::SUCCESS)
        }

        CacheAction::Force {
            kind,
            artifact,
            reason,
            store,
            config,
        } => {
            let cache = open_cache(store)?;
            cache.set_override(&artifact, issue_kind(kind), true, reason.as_deref());

            let settings = Config::load_or_default(config.as_deref())
                .context("failed to load configuration")?;
            audit::record_event(
                &settings.audit,
                "force-download-set",
                &artifact,
                &format!("{}: {}", kind_name(kind), reason.as_deref().unwrap_or("")),
            );

            println!(
                "{} force-download enabled for the {} check: {}",
                "!".yellow().bold(),
                kind_name(kind),
                artifact
            );
            Ok(ExitCode::SUCCESS)
        }

        CacheAction::Unforce {
            kind,
            artifact,
            store,
            config,
        } => {
            let cache = open_cache(store)?;
            cache.set_override(&artifact, issue_kind(kind), false, None);

            let settings = Config::load_or_default(config.as_deref())
                .context("failed to load configuration")?;
            audit::record_event(
                &settings.audit,
                "force-download-cleared",
                &artifact,
                kind_name(kind),
            );

            println!(
                "Force-download disabled for the {} check: {}",
                kind_name(kind),
                artifact
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_cache(store: Option<PathBuf>) -> anyhow::Result<DecisionCache> {
    let root = store.unwrap_or_else(default_store_path);
    let file_store = FileStore::new(root.clone())
        .with_context(|| format!("failed to open property store at '{}'", root.display()))?;
    Ok(DecisionCache::new(Arc::new(file_store)))
}

fn issue_kind(kind: OverrideKind) -> IssueKind {
    match kind {
        OverrideKind::Vulnerabilities => IssueKind::Vulnerability,
        OverrideKind::Licenses => IssueKind::License,
    }
}

fn kind_name(kind: OverrideKind) -> &'static str {
    match kind {
        OverrideKind::Vulnerabilities => "vulnerabilities",
        OverrideKind::Licenses => "licenses",
    }
}

fn print_override(name: &str, enabled: bool, justification: Option<&str>) {
    if enabled {
        match justification {
            Some(reason) => println!(
                "Force-download ({name}): {} ({reason})",
                "enabled".yellow().bold()
            ),
            None => println!("Force-download ({name}): {}", "enabled".yellow().bold()),
        }
    } else {
        println!("Force-download ({name}): disabled");
    }
}
