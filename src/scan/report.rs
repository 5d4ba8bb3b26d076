//! Offline scan collaborator backed by a pre-fetched JSON report.
//!
//! Air-gapped hosts and the CLI export the provider's test results to a
//! report file keyed by artifact path; scans then resolve against that file
//! instead of the network. An artifact missing from the report counts as a
//! scan failure, so the configured fail policy applies to it.

use crate::gate::ecosystem::Ecosystem;
use crate::gate::issue::{Issue, IssueKind, ScanResult};
use crate::gate::severity::Severity;
use crate::scan::{ArtifactLayout, PackageCoordinates, PackageScanner, ScanError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse report file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct ReportIssue {
    id: String,
    severity: Severity,
}

#[derive(Debug, Clone, Deserialize)]
struct ReportEntry {
    path: String,
    #[serde(default)]
    organization: Option<String>,
    module: String,
    revision: String,
    #[serde(default)]
    vulnerabilities: Vec<ReportIssue>,
    #[serde(default)]
    licenses: Vec<ReportIssue>,
}

#[derive(Debug, Deserialize)]
struct ReportFile {
    artifacts: Vec<ReportEntry>,
}

/// Scanner over a pre-fetched report, usable for every ecosystem.
pub struct ReportScanner {
    entries: HashMap<String, ReportEntry>,
}

impl ReportScanner {
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ReportError> {
        let report: ReportFile = serde_json::from_str(content)?;
        let entries = report
            .artifacts
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PackageScanner for ReportScanner {
    fn scan(&self, layout: &ArtifactLayout) -> Result<ScanResult, ScanError> {
        let entry = self
            .entries
            .get(&layout.path)
            .ok_or_else(|| ScanError::NotInReport(layout.path.clone()))?;

        let convert = |issues: &[ReportIssue], kind: IssueKind| {
            issues
                .iter()
                .map(|issue| Issue::new(&issue.id, issue.severity, kind))
                .collect::<Vec<_>>()
        };

        debug!(
            path = layout.path.as_str(),
            vulnerabilities = entry.vulnerabilities.len(),
            licenses = entry.licenses.len(),
            "resolved artifact from scan report"
        );

        Ok(ScanResult::new(
            Ecosystem::from_path(&layout.path),
            PackageCoordinates {
                organization: entry.organization.clone(),
                module: entry.module.clone(),
                revision: entry.revision.clone(),
            },
            convert(&entry.vulnerabilities, IssueKind::Vulnerability),
            convert(&entry.licenses, IssueKind::License),
        ))
    }
}
