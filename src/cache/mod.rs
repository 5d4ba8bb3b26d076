//! Persisted per-artifact decision metadata.
//!
//! A successful scan is memoized as a set of artifact properties; the
//! presence of a non-empty vulnerability summary is the sole signal that an
//! artifact has already been scanned, and the pipeline never re-invokes the
//! scan collaborator for an artifact carrying it.

pub mod store;

pub use store::{FileStore, MemoryStore, PropertyStore};

use crate::gate::issue::IssueKind;
use std::sync::Arc;
use tracing::{debug, warn};

/// Artifact properties persisted in the repository manager's metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactProperty {
    Vulnerabilities,
    VulnerabilitiesForceDownload,
    VulnerabilitiesForceDownloadInfo,
    Licenses,
    LicensesForceDownload,
    LicensesForceDownloadInfo,
    IssueUrl,
}

impl ArtifactProperty {
    pub fn key(&self) -> &'static str {
        match self {
            ArtifactProperty::Vulnerabilities => "depgate.issue.vulnerabilities",
            ArtifactProperty::VulnerabilitiesForceDownload => {
                "depgate.issue.vulnerabilities.forceDownload"
            }
            ArtifactProperty::VulnerabilitiesForceDownloadInfo => {
                "depgate.issue.vulnerabilities.forceDownload.info"
            }
            ArtifactProperty::Licenses => "depgate.issue.licenses",
            ArtifactProperty::LicensesForceDownload => "depgate.issue.licenses.forceDownload",
            ArtifactProperty::LicensesForceDownloadInfo => {
                "depgate.issue.licenses.forceDownload.info"
            }
            ArtifactProperty::IssueUrl => "depgate.issue.url",
        }
    }
}

/// Operator override for one issue kind. An absent property reads as
/// disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideFlag {
    pub enabled: bool,
    pub justification: Option<String>,
}

/// Decision metadata read back from the property store. Absent fields are
/// None or disabled; reads never fail.
#[derive(Debug, Clone, Default)]
pub struct CachedDecision {
    pub vulnerability_summary: Option<String>,
    pub license_summary: Option<String>,
    pub issue_url: Option<String>,
    pub vulnerabilities_force_download: OverrideFlag,
    pub licenses_force_download: OverrideFlag,
}

impl CachedDecision {
    /// True when nothing at all is recorded for the artifact.
    pub fn is_empty(&self) -> bool {
        self.vulnerability_summary.is_none()
            && self.license_summary.is_none()
            && self.issue_url.is_none()
            && !self.vulnerabilities_force_download.enabled
            && !self.licenses_force_download.enabled
    }
}

/// What gets persisted after a successful scan.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub vulnerability_summary: String,
    pub license_summary: String,
    pub issue_url: String,
}

/// Read/write access to cached decisions, plus the already-scanned
/// predicate the pipeline keys on.
#[derive(Clone)]
pub struct DecisionCache {
    store: Arc<dyn PropertyStore>,
}

impl DecisionCache {
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self { store }
    }

    /// True iff the artifact carries a non-empty vulnerability summary.
    pub fn has_decision(&self, artifact: &str) -> bool {
        self.store
            .get_property(artifact, ArtifactProperty::Vulnerabilities.key())
            .is_some_and(|v| !v.is_empty())
    }

    pub fn read(&self, artifact: &str) -> CachedDecision {
        let get = |property: ArtifactProperty| self.store.get_property(artifact, property.key());
        let flag = |flag: ArtifactProperty, info: ArtifactProperty| OverrideFlag {
            enabled: get(flag).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            justification: get(info).filter(|v| !v.is_empty()),
        };
        CachedDecision {
            vulnerability_summary: get(ArtifactProperty::Vulnerabilities)
                .filter(|v| !v.is_empty()),
            license_summary: get(ArtifactProperty::Licenses).filter(|v| !v.is_empty()),
            issue_url: get(ArtifactProperty::IssueUrl).filter(|v| !v.is_empty()),
            vulnerabilities_force_download: flag(
                ArtifactProperty::VulnerabilitiesForceDownload,
                ArtifactProperty::VulnerabilitiesForceDownloadInfo,
            ),
            licenses_force_download: flag(
                ArtifactProperty::LicensesForceDownload,
                ArtifactProperty::LicensesForceDownloadInfo,
            ),
        }
    }

    /// Persist a scan outcome. A no-op when a decision is already present,
    /// so duplicate scans racing on one artifact never clobber each other's
    /// properties. Store failures are logged and do not affect the decision.
    pub fn write(&self, artifact: &str, record: &ScanRecord) {
        if self.has_decision(artifact) {
            debug!(
                artifact = artifact,
                "decision already cached, skipping property update"
            );
            return;
        }
        self.set(artifact, ArtifactProperty::Vulnerabilities, &record.vulnerability_summary);
        self.set(artifact, ArtifactProperty::VulnerabilitiesForceDownload, "false");
        self.set(artifact, ArtifactProperty::VulnerabilitiesForceDownloadInfo, "");
        self.set(artifact, ArtifactProperty::Licenses, &record.license_summary);
        self.set(artifact, ArtifactProperty::LicensesForceDownload, "false");
        self.set(artifact, ArtifactProperty::LicensesForceDownloadInfo, "");
        self.set(artifact, ArtifactProperty::IssueUrl, &record.issue_url);
    }

    /// Clear the cached summaries so the next request rescans. Implemented
    /// by writing empty values, since the already-scanned predicate tests
    /// non-emptiness.
    pub fn clear(&self, artifact: &str) {
        self.set(artifact, ArtifactProperty::Vulnerabilities, "");
        self.set(artifact, ArtifactProperty::Licenses, "");
        self.set(artifact, ArtifactProperty::IssueUrl, "");
    }

    /// Set or remove a force-download override for one issue kind.
    pub fn set_override(
        &self,
        artifact: &str,
        kind: IssueKind,
        enabled: bool,
        justification: Option<&str>,
    ) {
        let (flag, info) = match kind {
            IssueKind::Vulnerability => (
                ArtifactProperty::VulnerabilitiesForceDownload,
                ArtifactProperty::VulnerabilitiesForceDownloadInfo,
            ),
            IssueKind::License => (
                ArtifactProperty::LicensesForceDownload,
                ArtifactProperty::LicensesForceDownloadInfo,
            ),
        };
        self.set(artifact, flag, if enabled { "true" } else { "false" });
        self.set(artifact, info, justification.unwrap_or(""));
    }

    fn set(&self, artifact: &str, property: ArtifactProperty, value: &str) {
        if let Err(e) = self.store.set_property(artifact, property.key(), value) {
            warn!(
                artifact = artifact,
                property = property.key(),
                error = %e,
                "failed to persist artifact property"
            );
        }
    }
}
