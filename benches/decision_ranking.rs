//! Decision hot path benchmarks
//!
//! Ranking runs once per loop iteration and weight derivation once per
//! cache miss, so both should stay well below executor latencies.
//!
//! Run: cargo bench --bench decision_ranking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use helmsman::domain::models::{
    AggregationMode, Candidate, DecisionConfig, LearningConfig, Outcome, OutcomeRecord, Path,
    ScoreComponents, WeightVector,
};
use helmsman::services::{derive_weights, DecisionEngine};

fn candidates(count: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| {
            let spread = (i % 10) as f64;
            Candidate::new(format!("c{i}"), format!("candidate {i}"))
                .with_effort(spread)
                .with_risk(10.0 - spread)
                .with_alignment(spread / 10.0)
                .with_confidence(1.0 - spread / 20.0)
        })
        .collect()
}

fn bench_rank_candidates(c: &mut Criterion) {
    let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
    let weights = WeightVector::default();

    let mut group = c.benchmark_group("rank_candidates");
    for count in [3, 10, 50, 200] {
        let input = candidates(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| engine.rank_candidates(black_box(input), black_box(&weights)).unwrap());
        });
    }
    group.finish();
}

fn bench_rank_paths(c: &mut Criterion) {
    let engine = DecisionEngine::new(DecisionConfig {
        aggregation: AggregationMode::Weighted,
        ..Default::default()
    })
    .unwrap();
    let weights = WeightVector::default();
    let steps = candidates(60);
    let paths: Vec<Path> = steps.chunks(4).map(|chunk| Path::new(chunk.to_vec())).collect();

    c.bench_function("rank_lookahead_paths", |b| {
        b.iter(|| engine.rank(black_box(&paths), black_box(&weights)).unwrap());
    });
}

fn bench_derive_weights(c: &mut Criterion) {
    let config = LearningConfig::default();
    let records: Vec<OutcomeRecord> = (0..1_000)
        .map(|i| {
            let outcome = if i % 7 == 0 { Outcome::Failure } else { Outcome::Success };
            let weights = WeightVector::new(0.2, 0.3, 0.4, 0.1 + (i % 5) as f64 * 0.01).normalized();
            OutcomeRecord::new("install", format!("c{i}"), weights, ScoreComponents::default(), 6.0, outcome)
        })
        .collect();

    c.bench_function("derive_weights_1000_records", |b| {
        b.iter(|| derive_weights(black_box("install"), black_box(&records), &config));
    });
}

criterion_group!(benches, bench_rank_candidates, bench_rank_paths, bench_derive_weights);
criterion_main!(benches);
