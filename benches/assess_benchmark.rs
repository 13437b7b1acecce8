use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dashcheck::assess::{AssessOptions, Assessor, CheckRegistry, MockRunner};
use dashcheck::validate::{ElementPresence, alignment_issues, calculate_score};
use std::path::Path;

fn fixture_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/dashboard"))
}

fn benchmark_assess(c: &mut Criterion) {
    let assessor = Assessor::new(CheckRegistry::with_defaults(), Box::new(MockRunner::unavailable()));

    c.bench_function("assess_fixture", |b| {
        b.iter(|| {
            let report = assessor.assess(black_box(fixture_dir()), AssessOptions::default());
            assert!(report.is_ok());
        })
    });
}

fn benchmark_visual_score(c: &mut Criterion) {
    let source = std::fs::read_to_string(fixture_dir().join("streamlit_app.py")).unwrap_or_default();

    c.bench_function("visual_score", |b| {
        b.iter(|| {
            let elements = ElementPresence::analyze(black_box(&source));
            let issues = alignment_issues(&source);
            calculate_score(&elements, &issues)
        })
    });
}

criterion_group!(benches, benchmark_assess, benchmark_visual_score);
criterion_main!(benches);
