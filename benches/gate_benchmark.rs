//! Gate Evaluation Benchmark
//!
//! Measures throughput of the per-request decision pipeline: ecosystem
//! classification, first-scan evaluation (cache miss) and repeat-request
//! evaluation (cache hit), across issue-list sizes.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use depgate::cache::MemoryStore;
use depgate::config::settings::Config;
use depgate::gate::ecosystem::Ecosystem;
use depgate::gate::issue::{Issue, IssueKind, ScanResult};
use depgate::gate::pipeline::Gate;
use depgate::gate::severity::Severity;
use depgate::scan::{ArtifactLayout, LayoutInspector, PackageScanner, ScanError, ScannerRegistry};
use std::sync::Arc;

const ARTIFACT: &str = "npm/lodash/lodash-4.17.20.tgz";

const CLASSIFY_PATHS: &[&str] = &[
    "org/example/1.0/example-1.0.jar",
    "npm/lodash/lodash-4.17.20.tgz",
    "pypi/lib/lib-2.0-py3-none-any.whl",
    "pypi/pkg/pkg-2.0.1.tar.gz",
    "docs/readme-1.0.txt",
];

/// Issue-list sizes exercised by the evaluation benchmarks.
const ISSUE_COUNTS: &[usize] = &[1, 10, 100];

struct PathLayout;

impl LayoutInspector for PathLayout {
    fn layout_of(&self, artifact: &str) -> Option<ArtifactLayout> {
        ArtifactLayout::derive(artifact, None, None, None)
    }
}

/// Scanner answering instantly with a fixed issue list, so the benchmark
/// measures the pipeline rather than any I/O.
struct FixedScanner {
    vulnerabilities: Vec<Issue>,
}

impl PackageScanner for FixedScanner {
    fn scan(&self, layout: &ArtifactLayout) -> Result<ScanResult, ScanError> {
        Ok(ScanResult::new(
            Ecosystem::from_path(&layout.path),
            layout.coordinates.clone(),
            self.vulnerabilities.clone(),
            Vec::new(),
        ))
    }
}

fn issues(count: usize) -> Vec<Issue> {
    (0..count)
        .map(|i| {
            let severity = match i % 4 {
                0 => Severity::Low,
                1 => Severity::Medium,
                2 => Severity::High,
                _ => Severity::Critical,
            };
            Issue::new(&format!("CVE-{i}"), severity, IssueKind::Vulnerability)
        })
        .collect()
}

fn make_gate(store: Arc<MemoryStore>, issue_count: usize) -> Gate {
    let scanner = Arc::new(FixedScanner {
        vulnerabilities: issues(issue_count),
    });
    Gate::new(
        &Config::default(),
        store,
        ScannerRegistry::with_all(scanner),
        Box::new(PathLayout),
    )
}

fn classify_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for path in CLASSIFY_PATHS {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, path| {
            b.iter(|| Ecosystem::from_path(black_box(path)))
        });
    }
    group.finish();
}

fn evaluate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for &count in ISSUE_COUNTS {
        // Cache miss: every iteration starts from an empty store, so the
        // pipeline scans, summarizes and persists.
        group.bench_with_input(
            BenchmarkId::new("cache_miss", count),
            &count,
            |b, &count| {
                b.iter_batched(
                    || make_gate(Arc::new(MemoryStore::new()), count),
                    |gate| gate.evaluate(black_box(ARTIFACT)),
                    BatchSize::SmallInput,
                )
            },
        );

        // Cache hit: the artifact was scanned once up front; iterations
        // re-derive the decision from the persisted summary.
        group.bench_with_input(
            BenchmarkId::new("cache_hit", count),
            &count,
            |b, &count| {
                let store = Arc::new(MemoryStore::new());
                let gate = make_gate(store, count);
                gate.evaluate(ARTIFACT);
                b.iter(|| gate.evaluate(black_box(ARTIFACT)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, classify_benchmark, evaluate_benchmark);
criterion_main!(benches);
