//! Benchmark: cross approximation of smooth functions and elementwise maps

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use ttsa_tensorci::{cross_elementwise, cross_grid, CrossOptions};

fn linspace(n: usize) -> Vec<f64> {
    (0..n).map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64).collect()
}

fn bench_cross_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_grid");
    for &n in &[4usize, 8, 12] {
        let grids = vec![linspace(64); n];
        group.bench_with_input(BenchmarkId::new("exp_sum", n), &grids, |b, grids| {
            b.iter(|| {
                let f = |rows: &[Vec<f64>]| {
                    rows.iter()
                        .map(|x| (x.iter().sum::<f64>() / x.len() as f64).exp())
                        .collect::<Vec<f64>>()
                };
                black_box(cross_grid(f, grids, &CrossOptions::default().with_tolerance(1e-8)))
            })
        });
    }
    group.finish();
}

fn bench_cross_elementwise(c: &mut Criterion) {
    let grids = vec![linspace(65); 6];
    let f = |rows: &[Vec<f64>]| {
        rows.iter()
            .map(|x| x.iter().enumerate().map(|(k, v)| (k + 1) as f64 * v).sum::<f64>())
            .collect::<Vec<f64>>()
    };
    let base = cross_grid(f, &grids, &CrossOptions::default())
        .expect("linear model")
        .tensor_train;

    c.bench_function("cross_elementwise_square", |b| {
        b.iter(|| {
            black_box(cross_elementwise(
                &[&base],
                |x: &[f64]| x[0] * x[0],
                &CrossOptions::default().with_tolerance(1e-10),
            ))
        })
    });
}

criterion_group!(benches, bench_cross_grid, bench_cross_elementwise);
criterion_main!(benches);
