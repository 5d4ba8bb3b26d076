//! Integration tests for the artifact evaluation pipeline.

use depgate::cache::{ArtifactProperty, DecisionCache, MemoryStore, PropertyStore};
use depgate::config::settings::Config;
use depgate::gate::ecosystem::Ecosystem;
use depgate::gate::issue::{Issue, IssueKind, ScanResult};
use depgate::gate::pipeline::{Gate, Outcome};
use depgate::gate::severity::Severity;
use depgate::scan::{
    ArtifactLayout, LayoutInspector, PackageScanner, ScanError, ScannerRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct PathLayout;

impl LayoutInspector for PathLayout {
    fn layout_of(&self, artifact: &str) -> Option<ArtifactLayout> {
        ArtifactLayout::derive(artifact, None, None, None)
    }
}

/// Scanner returning a fixed result, counting how often it is invoked.
struct StubScanner {
    vulnerabilities: Vec<Issue>,
    licenses: Vec<Issue>,
    calls: AtomicUsize,
}

impl StubScanner {
    fn new(vulnerabilities: Vec<Issue>, licenses: Vec<Issue>) -> Arc<Self> {
        Arc::new(Self {
            vulnerabilities,
            licenses,
            calls: AtomicUsize::new(0),
        })
    }

    fn clean() -> Arc<Self> {
        Self::new(Vec::new(), Vec::new())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PackageScanner for StubScanner {
    fn scan(&self, layout: &ArtifactLayout) -> Result<ScanResult, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ScanResult::new(
            Ecosystem::from_path(&layout.path),
            layout.coordinates.clone(),
            self.vulnerabilities.clone(),
            self.licenses.clone(),
        ))
    }
}

struct FailingScanner;

impl PackageScanner for FailingScanner {
    fn scan(&self, _layout: &ArtifactLayout) -> Result<ScanResult, ScanError> {
        Err(ScanError::Unavailable("connection refused".to_string()))
    }
}

fn config(vulnerability: Severity, license: Severity) -> Config {
    let mut config = Config::default();
    config.scanner.vulnerability_threshold = vulnerability;
    config.scanner.license_threshold = license;
    config
}

fn gate(config: &Config, store: Arc<dyn PropertyStore>, scanner: Arc<dyn PackageScanner>) -> Gate {
    Gate::new(
        config,
        store,
        ScannerRegistry::with_all(scanner),
        Box::new(PathLayout),
    )
}

fn vuln(id: &str, severity: Severity) -> Issue {
    Issue::new(id, severity, IssueKind::Vulnerability)
}

fn license(id: &str, severity: Severity) -> Issue {
    Issue::new(id, severity, IssueKind::License)
}

const NPM_ARTIFACT: &str = "npm/lodash/lodash-4.17.20.tgz";

#[test]
fn unsupported_artifacts_allow_without_scanning() {
    let scanner = StubScanner::clean();
    let gate = gate(
        &config(Severity::Low, Severity::Low),
        Arc::new(MemoryStore::new()),
        scanner.clone(),
    );

    assert_eq!(gate.evaluate("docs/readme-1.0.txt"), Outcome::Allow);
    assert_eq!(scanner.calls(), 0);
}

#[test]
fn disabled_ecosystem_allows_without_scanning() {
    let scanner = StubScanner::new(vec![vuln("CVE-1", Severity::Critical)], Vec::new());
    let mut config = config(Severity::Low, Severity::Low);
    config.ecosystems.maven = false;
    let gate = gate(&config, Arc::new(MemoryStore::new()), scanner.clone());

    assert_eq!(gate.evaluate("org/example/1.0/example-1.0.jar"), Outcome::Allow);
    assert_eq!(scanner.calls(), 0);
}

#[test]
fn high_issue_denies_at_medium_threshold_and_persists_deduped_summary() {
    let scanner = StubScanner::new(
        vec![
            vuln("CVE-1", Severity::High),
            vuln("CVE-1", Severity::High),
            vuln("CVE-2", Severity::Low),
        ],
        Vec::new(),
    );
    let store = Arc::new(MemoryStore::new());
    let gate = gate(
        &config(Severity::Medium, Severity::Low),
        store.clone(),
        scanner,
    );

    let outcome = gate.evaluate(NPM_ARTIFACT);
    assert_eq!(outcome.http_status(), 403);
    assert_eq!(
        outcome.reason(),
        Some(
            "artifact 'npm/lodash/lodash-4.17.20.tgz' has vulnerabilities \
             with severity medium, high or critical"
        )
    );

    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::Vulnerabilities.key()),
        Some("0 critical, 1 high, 0 medium, 1 low".to_string())
    );
}

#[test]
fn clean_scan_allows_and_records_zero_summaries() {
    let store = Arc::new(MemoryStore::new());
    let gate = gate(
        &config(Severity::Low, Severity::Low),
        store.clone(),
        StubScanner::clean(),
    );

    assert_eq!(gate.evaluate(NPM_ARTIFACT), Outcome::Allow);

    let zero = Some("0 critical, 0 high, 0 medium, 0 low".to_string());
    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::Vulnerabilities.key()),
        zero
    );
    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::Licenses.key()),
        zero
    );
    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::IssueUrl.key()),
        Some("https://snyk.io/vuln/npm:lodash@4.17.20".to_string())
    );
}

#[test]
fn second_request_reuses_the_cached_decision() {
    let scanner = StubScanner::new(vec![vuln("CVE-1", Severity::High)], Vec::new());
    let store = Arc::new(MemoryStore::new());
    let gate = gate(&config(Severity::Low, Severity::Low), store, scanner.clone());

    let first = gate.evaluate(NPM_ARTIFACT);
    let second = gate.evaluate(NPM_ARTIFACT);

    assert_eq!(scanner.calls(), 1, "cached artifact must not be rescanned");
    assert_eq!(first.http_status(), 403);
    assert_eq!(second.http_status(), 403);
}

#[test]
fn operator_override_unblocks_without_rescanning() {
    let scanner = StubScanner::new(vec![vuln("CVE-1", Severity::Critical)], Vec::new());
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let gate = gate(
        &config(Severity::Low, Severity::Low),
        store.clone(),
        scanner.clone(),
    );

    assert_eq!(gate.evaluate(NPM_ARTIFACT).http_status(), 403);

    let cache = DecisionCache::new(store);
    cache.set_override(NPM_ARTIFACT, IssueKind::Vulnerability, true, Some("SEC-42"));

    assert_eq!(gate.evaluate(NPM_ARTIFACT), Outcome::Allow);
    assert_eq!(scanner.calls(), 1);
}

#[test]
fn vulnerability_override_does_not_silence_the_license_check() {
    let scanner = StubScanner::new(Vec::new(), vec![license("LIC-1", Severity::High)]);
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());

    let cache = DecisionCache::new(store.clone());
    cache.set_override(NPM_ARTIFACT, IssueKind::Vulnerability, true, None);

    let gate = gate(&config(Severity::Low, Severity::Low), store, scanner);
    let outcome = gate.evaluate(NPM_ARTIFACT);
    assert_eq!(outcome.http_status(), 403);
    assert!(outcome.reason().unwrap().contains("license issues"));
}

#[test]
fn fail_closed_reports_a_gate_error() {
    let store = Arc::new(MemoryStore::new());
    let gate = gate(
        &config(Severity::Low, Severity::Low),
        store.clone(),
        Arc::new(FailingScanner),
    );

    let outcome = gate.evaluate(NPM_ARTIFACT);
    assert_eq!(outcome.http_status(), 500);
    assert!(outcome.reason().unwrap().contains("scan service unavailable"));

    // An unscanned artifact must never be marked as scanned.
    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::Vulnerabilities.key()),
        None
    );
}

#[test]
fn fail_open_allows_and_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let mut config = config(Severity::Low, Severity::Low);
    config.scanner.block_on_api_failure = false;
    let gate = gate(&config, store.clone(), Arc::new(FailingScanner));

    assert_eq!(gate.evaluate(NPM_ARTIFACT), Outcome::Allow);
    assert_eq!(
        store.get_property(NPM_ARTIFACT, ArtifactProperty::Vulnerabilities.key()),
        None
    );
}

#[test]
fn no_registered_scanner_applies_the_fail_policy() {
    let gate = Gate::new(
        &config(Severity::Low, Severity::Low),
        Arc::new(MemoryStore::new()),
        ScannerRegistry::new(),
        Box::new(PathLayout),
    );
    assert_eq!(gate.evaluate(NPM_ARTIFACT).http_status(), 500);
}

#[test]
fn unresolvable_layout_allows_without_scanning() {
    let scanner = StubScanner::new(vec![vuln("CVE-1", Severity::Critical)], Vec::new());
    let gate = gate(
        &config(Severity::Low, Severity::Low),
        Arc::new(MemoryStore::new()),
        scanner.clone(),
    );

    // `.jar` extension but no derivable module/revision.
    assert_eq!(gate.evaluate("noversion.jar"), Outcome::Allow);
    assert_eq!(scanner.calls(), 0);
}

#[test]
fn preseeded_summary_blocks_without_rescanning() {
    let scanner = StubScanner::clean();
    let store = Arc::new(MemoryStore::new());
    store
        .set_property(
            NPM_ARTIFACT,
            ArtifactProperty::Vulnerabilities.key(),
            "1 critical, 0 high, 0 medium, 0 low",
        )
        .unwrap();

    let gate = gate(
        &config(Severity::Low, Severity::Low),
        store,
        scanner.clone(),
    );
    assert_eq!(gate.evaluate(NPM_ARTIFACT).http_status(), 403);
    assert_eq!(scanner.calls(), 0);
}

#[test]
fn corrupt_cached_summary_still_counts_as_scanned() {
    let scanner = StubScanner::new(vec![vuln("CVE-1", Severity::Critical)], Vec::new());
    let store = Arc::new(MemoryStore::new());
    store
        .set_property(
            NPM_ARTIFACT,
            ArtifactProperty::Vulnerabilities.key(),
            "not a summary",
        )
        .unwrap();

    let gate = gate(&config(Severity::Low, Severity::Low), store, scanner.clone());

    // Unreadable counts degrade to empty; the artifact is not rescanned.
    assert_eq!(gate.evaluate(NPM_ARTIFACT), Outcome::Allow);
    assert_eq!(scanner.calls(), 0);
}
