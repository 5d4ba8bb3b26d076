//! Per-artifact decision pipeline.
//!
//! Ties classification, the scan collaborator, the decision cache and the
//! policy evaluator into one synchronous evaluation per request. This is the
//! single place where scan failures and policy outcomes are converted into
//! the verdict the enforcement boundary acts on.

use crate::cache::{DecisionCache, PropertyStore, ScanRecord};
use crate::config::settings::Config;
use crate::gate::ecosystem::{Classification, Classifier};
use crate::gate::issue::{IssueSummary, ScanResult};
use crate::gate::policy::{Decision, PolicyEvaluator};
use crate::scan::{LayoutInspector, ScannerRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Final verdict for one artifact request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Serve the artifact.
    Allow,
    /// Refuse the artifact: the policy denied it.
    Deny { reason: String },
    /// Refuse the artifact: the gate itself could not evaluate it.
    Error { reason: String },
}

impl Outcome {
    /// Status the enforcement boundary is expected to answer with. Policy
    /// denials are 403; gate failures are 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Outcome::Allow => 200,
            Outcome::Deny { .. } => 403,
            Outcome::Error { .. } => 500,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Outcome::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Allow => None,
            Outcome::Deny { reason } | Outcome::Error { reason } => Some(reason),
        }
    }
}

/// The evaluation pipeline for artifact requests.
pub struct Gate {
    classifier: Classifier,
    evaluator: PolicyEvaluator,
    cache: DecisionCache,
    scanners: ScannerRegistry,
    inspector: Box<dyn LayoutInspector>,
    block_on_api_failure: bool,
    vuln_base_url: String,
}

impl Gate {
    pub fn new(
        config: &Config,
        store: Arc<dyn PropertyStore>,
        scanners: ScannerRegistry,
        inspector: Box<dyn LayoutInspector>,
    ) -> Self {
        Self {
            classifier: Classifier::new(
                config.ecosystems.maven,
                config.ecosystems.npm,
                config.ecosystems.pypi,
            ),
            evaluator: PolicyEvaluator::new(
                config.scanner.vulnerability_threshold,
                config.scanner.license_threshold,
            ),
            cache: DecisionCache::new(store),
            scanners,
            inspector,
            block_on_api_failure: config.scanner.block_on_api_failure,
            vuln_base_url: config.api.vuln_base_url.clone(),
        }
    }

    /// Evaluate one artifact request synchronously in the calling thread.
    pub fn evaluate(&self, artifact: &str) -> Outcome {
        let Some(layout) = self.inspector.layout_of(artifact) else {
            warn!(
                artifact = artifact,
                "artifact layout is missing or invalid, allowing without scan"
            );
            return Outcome::Allow;
        };

        let ecosystem = match self.classifier.classify(&layout.path) {
            Classification::Unsupported => {
                info!(
                    artifact = artifact,
                    "artifact extension is not supported, allowing without scan"
                );
                return Outcome::Allow;
            }
            Classification::Disabled(ecosystem) => {
                debug!(
                    artifact = artifact,
                    ecosystem = %ecosystem,
                    "ecosystem scanning is disabled, allowing without scan"
                );
                return Outcome::Allow;
            }
            Classification::Enabled(ecosystem) => ecosystem,
        };

        // A non-empty cached vulnerability summary means the artifact was
        // already scanned; the scan collaborator must not be invoked again.
        if self.cache.has_decision(artifact) {
            debug!(artifact = artifact, "reusing cached decision");
            return self.evaluate_cached(artifact);
        }

        let Some(scanner) = self.scanners.scanner_for(ecosystem) else {
            return self.scan_failed(artifact, "no scanner registered for this ecosystem");
        };

        match scanner.scan(&layout) {
            Ok(result) => self.evaluate_fresh(artifact, &result),
            Err(e) => self.scan_failed(artifact, &e.to_string()),
        }
    }

    fn evaluate_cached(&self, artifact: &str) -> Outcome {
        let cached = self.cache.read(artifact);
        let vulnerabilities =
            parse_summary(artifact, "vulnerability", cached.vulnerability_summary.as_deref());
        let licenses = parse_summary(artifact, "license", cached.license_summary.as_deref());

        let decision = self.evaluator.vulnerabilities_from_summary(
            artifact,
            &vulnerabilities,
            &cached.vulnerabilities_force_download,
        );
        if let Decision::Deny(reason) = decision {
            return Outcome::Deny { reason };
        }

        let decision = self.evaluator.licenses_from_summary(
            artifact,
            &licenses,
            &cached.licenses_force_download,
        );
        if let Decision::Deny(reason) = decision {
            return Outcome::Deny { reason };
        }

        Outcome::Allow
    }

    fn evaluate_fresh(&self, artifact: &str, result: &ScanResult) -> Outcome {
        let record = ScanRecord {
            vulnerability_summary: IssueSummary::of(result.vulnerabilities()).to_string(),
            license_summary: IssueSummary::of(result.licenses()).to_string(),
            issue_url: result.reference_url(&self.vuln_base_url),
        };
        self.cache.write(artifact, &record);

        // Override flags are read back fresh so an operator's change takes
        // effect on this request, not the next restart.
        let cached = self.cache.read(artifact);

        let decision = self.evaluator.vulnerabilities(
            artifact,
            result.vulnerabilities(),
            &cached.vulnerabilities_force_download,
        );
        if let Decision::Deny(reason) = decision {
            return Outcome::Deny { reason };
        }

        let decision =
            self.evaluator
                .licenses(artifact, result.licenses(), &cached.licenses_force_download);
        if let Decision::Deny(reason) = decision {
            return Outcome::Deny { reason };
        }

        Outcome::Allow
    }

    /// Apply the configured fail policy. An unscanned artifact is never
    /// marked as scanned, so there is no cache write on either branch.
    fn scan_failed(&self, artifact: &str, detail: &str) -> Outcome {
        if self.block_on_api_failure {
            Outcome::Error {
                reason: format!(
                    "artifact '{artifact}' could not be scanned, scan service unavailable: {detail}"
                ),
            }
        } else {
            warn!(
                artifact = artifact,
                detail = detail,
                "scan unavailable and block-on-api-failure is off, allowing download"
            );
            Outcome::Allow
        }
    }
}

/// Parse a persisted summary, treating a missing or unreadable value as
/// empty. The artifact still counts as scanned; operators clear the
/// property to force a rescan.
fn parse_summary(artifact: &str, kind: &str, summary: Option<&str>) -> IssueSummary {
    let Some(summary) = summary else {
        return IssueSummary::default();
    };
    summary.parse().unwrap_or_else(|e| {
        warn!(
            artifact = artifact,
            kind = kind,
            error = %e,
            "cached issue summary is unreadable, treating as empty"
        );
        IssueSummary::default()
    })
}
