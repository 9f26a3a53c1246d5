use criterion::{black_box, criterion_group, criterion_main, Criterion};

use irtcat_core::estimation::QuadratureGrid;
use irtcat_core::{estimate_ability_eap, estimate_ability_mle, ItemParameters, Response};

fn make_items(n: usize) -> Vec<ItemParameters> {
    (0..n)
        .map(|i| {
            let b = -3.0 + 6.0 * i as f64 / n.max(2) as f64;
            ItemParameters::two_pl(format!("b{i}"), b, 0.8 + (i % 5) as f64 * 0.3).unwrap()
        })
        .collect()
}

fn alternating(n: usize) -> Vec<Response> {
    (0..n).map(|i| Response::from(i % 3 != 0)).collect()
}

fn bench_eap(c: &mut Criterion) {
    let mut group = c.benchmark_group("eap");

    for n in [5, 20, 60] {
        let items = make_items(n);
        let responses = alternating(n);
        group.bench_function(format!("items={n}"), |b| {
            b.iter(|| estimate_ability_eap(black_box(&responses), black_box(&items), 0.0, 1.0))
        });
    }

    group.bench_function("fine_grid,items=20", |b| {
        let grid = QuadratureGrid::new(-6.0, 6.0, 161).unwrap();
        let items = make_items(20);
        let responses = alternating(20);
        let prior = Default::default();
        b.iter(|| grid.estimate(black_box(&responses), black_box(&items), &prior))
    });

    group.finish();
}

fn bench_mle(c: &mut Criterion) {
    let mut group = c.benchmark_group("mle");

    for n in [5, 20, 60] {
        let items = make_items(n);
        let responses = alternating(n);
        group.bench_function(format!("items={n}"), |b| {
            b.iter(|| estimate_ability_mle(black_box(&responses), black_box(&items), 0.0))
        });
    }

    group.bench_function("all_correct", |b| {
        let items = make_items(20);
        let responses = vec![Response::Correct; 20];
        b.iter(|| estimate_ability_mle(black_box(&responses), black_box(&items), 0.0))
    });

    group.finish();
}

criterion_group!(benches, bench_eap, bench_mle);
criterion_main!(benches);
