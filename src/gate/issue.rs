//! Issues reported by a dependency scan and their persisted summaries.

use crate::gate::ecosystem::Ecosystem;
use crate::gate::severity::Severity;
use crate::scan::PackageCoordinates;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Whether an issue is a security vulnerability or a license concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Vulnerability,
    License,
}

/// One reported problem in an artifact's dependency tree.
///
/// Issue ids are scoped to the ecosystem and may repeat when the same
/// underlying problem is reachable via several dependency paths; counting
/// deduplicates by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub kind: IssueKind,
}

impl Issue {
    pub fn new(id: &str, severity: Severity, kind: IssueKind) -> Self {
        Self {
            id: id.to_string(),
            severity,
            kind,
        }
    }
}

/// Normalized outcome of one scan call. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ScanResult {
    ecosystem: Ecosystem,
    coordinates: PackageCoordinates,
    vulnerabilities: Vec<Issue>,
    licenses: Vec<Issue>,
}

impl ScanResult {
    pub fn new(
        ecosystem: Ecosystem,
        coordinates: PackageCoordinates,
        vulnerabilities: Vec<Issue>,
        licenses: Vec<Issue>,
    ) -> Self {
        Self {
            ecosystem,
            coordinates,
            vulnerabilities,
            licenses,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn coordinates(&self) -> &PackageCoordinates {
        &self.coordinates
    }

    pub fn vulnerabilities(&self) -> &[Issue] {
        &self.vulnerabilities
    }

    pub fn licenses(&self) -> &[Issue] {
        &self.licenses
    }

    /// Issue-tracker URL for the scanned package. Maven packages carry an
    /// organization segment, URL-encoded as `%3A`; npm and PyPI do not.
    pub fn reference_url(&self, base: &str) -> String {
        let coords = &self.coordinates;
        match self.ecosystem {
            Ecosystem::Maven => format!(
                "{}maven:{}%3A{}@{}",
                base,
                coords.organization.as_deref().unwrap_or_default(),
                coords.module,
                coords.revision
            ),
            Ecosystem::Npm | Ecosystem::PyPi => format!(
                "{}{}:{}@{}",
                base,
                self.ecosystem.tag(),
                coords.module,
                coords.revision
            ),
            Ecosystem::Unsupported => base.to_string(),
        }
    }
}

/// Per-severity issue counts, deduplicated by issue id.
///
/// This is what gets persisted as artifact metadata; its rendered form is
/// independent of the thresholds used for the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueSummary {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl IssueSummary {
    /// Count issues per severity. The first occurrence of an id wins;
    /// later records with the same id do not count again.
    pub fn of(issues: &[Issue]) -> IssueSummary {
        let mut seen = HashSet::new();
        let mut summary = IssueSummary::default();
        for issue in issues {
            if !seen.insert(issue.id.as_str()) {
                continue;
            }
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

impl fmt::Display for IssueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} critical, {} high, {} medium, {} low",
            self.critical, self.high, self.medium, self.low
        )
    }
}

/// Error for summary strings that do not match the persisted format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed issue summary '{0}'")]
pub struct ParseSummaryError(pub String);

impl FromStr for IssueSummary {
    type Err = ParseSummaryError;

    /// Parse the persisted `"N critical, N high, N medium, N low"` form back
    /// into counts. Every label must appear exactly once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseSummaryError(s.to_string());

        let mut critical = None;
        let mut high = None;
        let mut medium = None;
        let mut low = None;

        for part in s.split(',') {
            let (count, label) = part.trim().split_once(' ').ok_or_else(malformed)?;
            let count: u64 = count.parse().map_err(|_| malformed())?;
            let slot = match label.trim() {
                "critical" => &mut critical,
                "high" => &mut high,
                "medium" => &mut medium,
                "low" => &mut low,
                _ => return Err(malformed()),
            };
            if slot.replace(count).is_some() {
                return Err(malformed());
            }
        }

        match (critical, high, medium, low) {
            (Some(critical), Some(high), Some(medium), Some(low)) => Ok(IssueSummary {
                critical,
                high,
                medium,
                low,
            }),
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vuln(id: &str, severity: Severity) -> Issue {
        Issue::new(id, severity, IssueKind::Vulnerability)
    }

    #[test]
    fn summary_counts_deduplicate_by_id() {
        let issues = vec![
            vuln("CVE-1", Severity::High),
            vuln("CVE-1", Severity::High),
            vuln("CVE-2", Severity::Low),
        ];
        let summary = IssueSummary::of(&issues);
        assert_eq!(summary.to_string(), "0 critical, 1 high, 0 medium, 1 low");
    }

    #[test]
    fn first_seen_severity_wins_for_counts() {
        let issues = vec![vuln("CVE-1", Severity::Low), vuln("CVE-1", Severity::High)];
        let summary = IssueSummary::of(&issues);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.high, 0);
    }

    #[test]
    fn empty_scan_renders_all_zero() {
        assert_eq!(
            IssueSummary::of(&[]).to_string(),
            "0 critical, 0 high, 0 medium, 0 low"
        );
    }

    #[test]
    fn summary_round_trips_through_display() {
        let summary = IssueSummary {
            critical: 2,
            high: 0,
            medium: 7,
            low: 1,
        };
        let parsed: IssueSummary = summary.to_string().parse().unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn malformed_summaries_fail_to_parse() {
        assert!("".parse::<IssueSummary>().is_err());
        assert!("1 critical".parse::<IssueSummary>().is_err());
        assert!("a critical, 0 high, 0 medium, 0 low"
            .parse::<IssueSummary>()
            .is_err());
        assert!("1 critical, 1 critical, 0 medium, 0 low"
            .parse::<IssueSummary>()
            .is_err());
    }

    #[test]
    fn maven_reference_url_includes_organization() {
        let result = ScanResult::new(
            Ecosystem::Maven,
            PackageCoordinates {
                organization: Some("org.example".to_string()),
                module: "example".to_string(),
                revision: "1.0".to_string(),
            },
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(
            result.reference_url("https://snyk.io/vuln/"),
            "https://snyk.io/vuln/maven:org.example%3Aexample@1.0"
        );
    }

    #[test]
    fn npm_and_pypi_reference_urls_skip_organization() {
        let coords = PackageCoordinates {
            organization: None,
            module: "lodash".to_string(),
            revision: "4.17.20".to_string(),
        };
        let npm = ScanResult::new(Ecosystem::Npm, coords.clone(), Vec::new(), Vec::new());
        assert_eq!(
            npm.reference_url("https://snyk.io/vuln/"),
            "https://snyk.io/vuln/npm:lodash@4.17.20"
        );
        let pypi = ScanResult::new(Ecosystem::PyPi, coords, Vec::new(), Vec::new());
        assert_eq!(
            pypi.reference_url("https://snyk.io/vuln/"),
            "https://snyk.io/vuln/pip:lodash@4.17.20"
        );
    }
}
