//! Criterion benchmarks for `phsrm-core`.
//!
//! The evaluator and the convolution dominate every EM step; both scale with
//! `right * n`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phsrm_core::{
    em_step, mexp_conv, mexpv, Direction, EmIterate, EngineConfig, FaultData, PoissonWeights,
    Uniformized, Workspace,
};

fn make_chain(n: usize) -> (Vec<f64>, Uniformized) {
    let rate: Vec<f64> = (1..=n).map(|i| 0.5 * i as f64).collect();
    let alpha = vec![1.0 / n as f64; n];
    let chain = Uniformized::new(&rate, 1.01).unwrap();
    (alpha, chain)
}

fn bench_evaluators(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("uniformization");

    for (name, n, t) in [("n10_short", 10, 1.0), ("n10_long", 10, 50.0), ("n50_long", 50, 50.0)] {
        let (alpha, chain) = make_chain(n);
        let mut weights = PoissonWeights::new();
        weights
            .prepare(chain.qv() * t, &config, 1)
            .unwrap();
        let mut ws = Workspace::new(n);
        let mut out = vec![0.0; n];
        let mut cross = vec![0.0; 2 * n];
        let ones = vec![1.0; n];

        group.bench_with_input(BenchmarkId::new("mexpv", name), &n, |b, _| {
            b.iter(|| {
                mexpv(&chain, Direction::Transpose, &weights, black_box(&alpha), &mut out, &mut ws)
                    .unwrap();
                black_box(&out);
            });
        });

        group.bench_with_input(BenchmarkId::new("mexp_conv", name), &n, |b, _| {
            b.iter(|| {
                mexp_conv(
                    &chain,
                    Direction::Transpose,
                    &weights,
                    black_box(&alpha),
                    black_box(&ones),
                    &mut out,
                    &mut cross,
                    &mut ws,
                )
                .unwrap();
                black_box(&cross);
            });
        });
    }

    group.finish();
}

fn bench_em_step(c: &mut Criterion) {
    let config = EngineConfig::default();
    let data = FaultData::from_counts(vec![3, 5, 2, 4, 1, 0, 2, 1, 3, 2, 0, 1, 1, 0, 1])
        .unwrap();
    let start = EmIterate::new(30.0, vec![0.25; 4], vec![0.2, 0.5, 1.0, 2.0])
        .unwrap();

    c.bench_function("em_step_4_phases", |b| {
        b.iter(|| black_box(em_step(black_box(&start), &data, &config)))
    });
}

criterion_group!(benches, bench_evaluators, bench_em_step);
criterion_main!(benches);
