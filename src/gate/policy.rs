//! Threshold evaluation for vulnerability and license issues.

use crate::cache::OverrideFlag;
use crate::gate::issue::{Issue, IssueKind, IssueSummary};
use crate::gate::severity::Severity;
use tracing::info;

/// Outcome of one policy check. Deny is an expected result, not an error;
/// the enforcement boundary translates it into whatever failure mechanism
/// the host expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Compares scan outcomes against the configured severity thresholds.
///
/// Vulnerability and license checks are independent: each has its own
/// threshold and its own force-download override, and an override on one
/// never affects the other.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    vulnerability_threshold: Severity,
    license_threshold: Severity,
}

impl PolicyEvaluator {
    pub fn new(vulnerability_threshold: Severity, license_threshold: Severity) -> Self {
        Self {
            vulnerability_threshold,
            license_threshold,
        }
    }

    /// Evaluate vulnerability issues from a fresh scan.
    pub fn vulnerabilities(
        &self,
        artifact: &str,
        issues: &[Issue],
        force: &OverrideFlag,
    ) -> Decision {
        self.check(
            artifact,
            IssueKind::Vulnerability,
            self.vulnerability_threshold,
            force,
            || {
                issues
                    .iter()
                    .any(|i| in_band(i.severity, self.vulnerability_threshold, IssueKind::Vulnerability))
            },
        )
    }

    /// Evaluate license issues from a fresh scan.
    pub fn licenses(&self, artifact: &str, issues: &[Issue], force: &OverrideFlag) -> Decision {
        self.check(
            artifact,
            IssueKind::License,
            self.license_threshold,
            force,
            || {
                issues
                    .iter()
                    .any(|i| in_band(i.severity, self.license_threshold, IssueKind::License))
            },
        )
    }

    /// Re-derive the vulnerability decision from a cached summary.
    pub fn vulnerabilities_from_summary(
        &self,
        artifact: &str,
        summary: &IssueSummary,
        force: &OverrideFlag,
    ) -> Decision {
        self.check(
            artifact,
            IssueKind::Vulnerability,
            self.vulnerability_threshold,
            force,
            || banded_count(summary, self.vulnerability_threshold, IssueKind::Vulnerability) > 0,
        )
    }

    /// Re-derive the license decision from a cached summary.
    pub fn licenses_from_summary(
        &self,
        artifact: &str,
        summary: &IssueSummary,
        force: &OverrideFlag,
    ) -> Decision {
        self.check(
            artifact,
            IssueKind::License,
            self.license_threshold,
            force,
            || banded_count(summary, self.license_threshold, IssueKind::License) > 0,
        )
    }

    fn check(
        &self,
        artifact: &str,
        kind: IssueKind,
        threshold: Severity,
        force: &OverrideFlag,
        over_threshold: impl FnOnce() -> bool,
    ) -> Decision {
        // The operator override always short-circuits, regardless of content.
        if force.enabled {
            info!(
                artifact = artifact,
                kind = ?kind,
                justification = force.justification.as_deref().unwrap_or(""),
                "force-download override is set, allowing download"
            );
            return Decision::Allow;
        }
        if over_threshold() {
            return Decision::Deny(deny_reason(artifact, threshold, kind));
        }
        Decision::Allow
    }
}

/// Whether an issue of the given severity triggers a block at the given
/// threshold. License evaluation recognizes only low, medium and high; a
/// critical license threshold matches nothing.
fn in_band(severity: Severity, threshold: Severity, kind: IssueKind) -> bool {
    match kind {
        IssueKind::Vulnerability => severity >= threshold,
        IssueKind::License => match threshold {
            Severity::Low => true,
            Severity::Medium => matches!(severity, Severity::Medium | Severity::High),
            Severity::High => severity == Severity::High,
            Severity::Critical => false,
        },
    }
}

/// Count of cached issues inside the threshold's band.
fn banded_count(summary: &IssueSummary, threshold: Severity, kind: IssueKind) -> u64 {
    match kind {
        IssueKind::Vulnerability => match threshold {
            Severity::Low => summary.total(),
            Severity::Medium => summary.critical + summary.high + summary.medium,
            Severity::High => summary.critical + summary.high,
            Severity::Critical => summary.critical,
        },
        IssueKind::License => match threshold {
            Severity::Low => summary.total(),
            Severity::Medium => summary.high + summary.medium,
            Severity::High => summary.high,
            Severity::Critical => 0,
        },
    }
}

fn deny_reason(artifact: &str, threshold: Severity, kind: IssueKind) -> String {
    let noun = match kind {
        IssueKind::Vulnerability => "vulnerabilities",
        IssueKind::License => "license issues",
    };
    let band = match (kind, threshold) {
        (_, Severity::Low) => None,
        (IssueKind::Vulnerability, Severity::Medium) => Some("medium, high or critical"),
        (IssueKind::Vulnerability, Severity::High) => Some("high or critical"),
        (_, Severity::Critical) => Some("critical"),
        (IssueKind::License, Severity::Medium) => Some("medium or high"),
        (IssueKind::License, Severity::High) => Some("high"),
    };
    match band {
        Some(band) => format!("artifact '{artifact}' has {noun} with severity {band}"),
        None => format!("artifact '{artifact}' has {noun}"),
    }
}
