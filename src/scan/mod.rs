//! Boundary to the external dependency-scan collaborators.
//!
//! The actual provider client (HTTP, auth, retries) lives in the host; this
//! module fixes the shapes the pipeline depends on: one capability trait per
//! ecosystem scanner, layout resolution for artifact keys, and the typed
//! failure the fail-open/fail-closed policy is applied to.

pub mod report;

pub use report::ReportScanner;

use crate::gate::ecosystem::Ecosystem;
use crate::gate::issue::ScanResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Coordinates of a package within its ecosystem. Only Maven carries an
/// organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCoordinates {
    pub organization: Option<String>,
    pub module: String,
    pub revision: String,
}

/// Layout information for one artifact, as resolved by the repository
/// manager (or derived from the path by the CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub path: String,
    pub coordinates: PackageCoordinates,
}

impl ArtifactLayout {
    /// Derive a layout from a bare artifact path plus whatever coordinates
    /// the caller already knows. Missing module/revision fall back to
    /// splitting the file stem at its last `-` (`name-1.2.3.ext`); wheel
    /// names use their first two `-`-separated fields. Returns None when no
    /// usable module and revision can be determined.
    pub fn derive(
        path: &str,
        organization: Option<&str>,
        module: Option<&str>,
        revision: Option<&str>,
    ) -> Option<ArtifactLayout> {
        let (module, revision) = match (module, revision) {
            (Some(module), Some(revision)) => (module.to_string(), revision.to_string()),
            _ => {
                let (derived_module, derived_revision) = split_stem(path)?;
                (
                    module.map_or_else(|| derived_module.to_string(), str::to_string),
                    revision.map_or_else(|| derived_revision.to_string(), str::to_string),
                )
            }
        };
        if module.is_empty() || revision.is_empty() {
            return None;
        }
        Some(ArtifactLayout {
            path: path.to_string(),
            coordinates: PackageCoordinates {
                organization: organization.map(str::to_string),
                module,
                revision,
            },
        })
    }
}

/// Split a file name into module and revision.
fn split_stem(path: &str) -> Option<(&str, &str)> {
    let name = path.rsplit('/').next()?;
    if let Some(stem) = name.strip_suffix(".whl") {
        // {dist}-{version}-{python}-{abi}-{platform}.whl
        let mut fields = stem.split('-');
        return Some((fields.next()?, fields.next()?));
    }
    let stem = [".tar.gz", ".jar", ".tgz", ".zip", ".egg"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .or_else(|| name.rsplit_once('.').map(|(stem, _)| stem))?;
    stem.rsplit_once('-')
}

/// Errors from a scan collaborator. Never retried here; retry policy, if
/// any, belongs to the collaborator.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The provider could not be reached or failed mid-request.
    #[error("scan service unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a non-success status.
    #[error("scan service returned status {0}")]
    UpstreamStatus(u16),

    /// The offline report collaborator has no entry for the artifact.
    #[error("no scan entry for artifact '{0}' in report")]
    NotInReport(String),
}

/// One ecosystem-specific dependency scanner.
pub trait PackageScanner: Send + Sync {
    fn scan(&self, layout: &ArtifactLayout) -> Result<ScanResult, ScanError>;
}

/// Resolves layout information for an artifact key.
pub trait LayoutInspector: Send + Sync {
    fn layout_of(&self, artifact: &str) -> Option<ArtifactLayout>;
}

/// Scanner selection per ecosystem. Ecosystems without a registered scanner
/// behave as if the scan service were unavailable.
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    maven: Option<Arc<dyn PackageScanner>>,
    npm: Option<Arc<dyn PackageScanner>>,
    pypi: Option<Arc<dyn PackageScanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scanner for one ecosystem. Registering for Unsupported is
    /// a no-op.
    pub fn register(mut self, ecosystem: Ecosystem, scanner: Arc<dyn PackageScanner>) -> Self {
        match ecosystem {
            Ecosystem::Maven => self.maven = Some(scanner),
            Ecosystem::Npm => self.npm = Some(scanner),
            Ecosystem::PyPi => self.pypi = Some(scanner),
            Ecosystem::Unsupported => {}
        }
        self
    }

    /// Use one scanner for every supported ecosystem.
    pub fn with_all(scanner: Arc<dyn PackageScanner>) -> Self {
        Self {
            maven: Some(scanner.clone()),
            npm: Some(scanner.clone()),
            pypi: Some(scanner),
        }
    }

    pub fn scanner_for(&self, ecosystem: Ecosystem) -> Option<&dyn PackageScanner> {
        match ecosystem {
            Ecosystem::Maven => self.maven.as_deref(),
            Ecosystem::Npm => self.npm.as_deref(),
            Ecosystem::PyPi => self.pypi.as_deref(),
            Ecosystem::Unsupported => None,
        }
    }
}
