//! Shared test utilities for depgate integration tests.
//!
//! Provides common helpers used across CLI test files to eliminate
//! boilerplate around temp stores, scan reports and gate invocations.

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Returns a `Command` configured to run the `depgate` binary.
#[allow(dead_code, deprecated)]
pub fn depgate_cmd() -> Command {
    Command::cargo_bin("depgate").unwrap()
}

/// A scan report with one vulnerable and one clean npm artifact.
#[allow(dead_code)]
pub const VULNERABLE_NPM: &str = "npm/lodash/lodash-4.17.20.tgz";
#[allow(dead_code)]
pub const CLEAN_NPM: &str = "npm/left-pad/left-pad-1.3.0.tgz";

#[allow(dead_code)]
pub fn write_report(dir: &TempDir) -> PathBuf {
    let report = r#"{
        "artifacts": [
            {
                "path": "npm/lodash/lodash-4.17.20.tgz",
                "module": "lodash",
                "revision": "4.17.20",
                "vulnerabilities": [
                    { "id": "SNYK-JS-LODASH-567746", "severity": "high" },
                    { "id": "SNYK-JS-LODASH-567746", "severity": "high" },
                    { "id": "SNYK-JS-LODASH-590103", "severity": "low" }
                ],
                "licenses": []
            },
            {
                "path": "npm/left-pad/left-pad-1.3.0.tgz",
                "module": "left-pad",
                "revision": "1.3.0",
                "vulnerabilities": [],
                "licenses": []
            }
        ]
    }"#;
    let path = dir.path().join("report.json");
    fs::write(&path, report).unwrap();
    path
}

/// Writes a config file that keeps the audit log inside the temp dir.
#[allow(dead_code)]
pub fn write_config(dir: &TempDir, extra: &str) -> PathBuf {
    let audit_path = dir.path().join("audit.log");
    let content = format!(
        "{extra}\n[audit]\npath = {:?}\n",
        audit_path.to_string_lossy()
    );
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

/// Runs `evaluate` for an artifact against a shared store directory,
/// optionally with a scan report, and returns the `Assert`.
#[allow(dead_code)]
pub fn evaluate(dir: &TempDir, artifact: &str, report: Option<&Path>) -> Assert {
    let config = write_config(dir, "");
    let mut cmd = depgate_cmd();
    cmd.arg("evaluate")
        .arg(artifact)
        .arg("--config")
        .arg(&config)
        .arg("--store")
        .arg(dir.path().join("store"));
    if let Some(report) = report {
        cmd.arg("--report").arg(report);
    }
    cmd.assert()
}
