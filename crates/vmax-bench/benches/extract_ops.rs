//! Criterion micro-benchmarks for the forward pipeline.

use criterion::{criterion_group, criterion_main, Criterion};
use vmax_bench::{as_states, extractor, reference_config, reference_scenarios, stress_config};
use vmax_features::FeaturesExtractor;

/// Benchmark: build an extractor (validation, key resolution, layout).
fn bench_extractor_new(c: &mut Criterion) {
    let config = reference_config();
    c.bench_function("extractor_new_reference", |b| {
        b.iter(|| {
            let ex = FeaturesExtractor::new(config.clone()).unwrap();
            std::hint::black_box(&ex);
        });
    });
}

/// Benchmark: project and extract one dense scenario.
fn bench_extract_state(c: &mut Criterion) {
    let ex = extractor(reference_config()).unwrap();
    let scenarios = reference_scenarios(42, 1);
    let state = &scenarios[0];

    c.bench_function("extract_state_reference", |b| {
        b.iter(|| {
            let features = ex.extract_state(state).unwrap();
            std::hint::black_box(&features);
        });
    });
}

/// Benchmark: same scenario against the stress profile.
fn bench_extract_state_stress(c: &mut Criterion) {
    let ex = extractor(stress_config()).unwrap();
    let scenarios = reference_scenarios(42, 1);
    let state = &scenarios[0];

    c.bench_function("extract_state_stress", |b| {
        b.iter(|| {
            let features = ex.extract_state(state).unwrap();
            std::hint::black_box(&features);
        });
    });
}

/// Benchmark: flatten already-extracted group tensors.
fn bench_flatten(c: &mut Criterion) {
    let ex = extractor(reference_config()).unwrap();
    let scenarios = reference_scenarios(42, 1);
    let features = ex.extract_state(&scenarios[0]).unwrap();

    c.bench_function("flatten_reference", |b| {
        b.iter(|| {
            let flat = ex.flatten(&features).unwrap();
            std::hint::black_box(&flat);
        });
    });
}

/// Benchmark: 16 scenarios into one `[16, W]` batch.
fn bench_extract_batch_16(c: &mut Criterion) {
    let ex = extractor(reference_config()).unwrap();
    let scenarios = reference_scenarios(7, 16);
    let states = as_states(&scenarios);

    c.bench_function("extract_batch_16", |b| {
        b.iter(|| {
            let batch = ex.extract_batch(&states).unwrap();
            std::hint::black_box(&batch);
        });
    });
}

criterion_group!(
    benches,
    bench_extractor_new,
    bench_extract_state,
    bench_extract_state_stress,
    bench_flatten,
    bench_extract_batch_16
);
criterion_main!(benches);
