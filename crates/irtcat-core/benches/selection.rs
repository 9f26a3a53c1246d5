use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use irtcat_core::traits::ScriptedResponses;
use irtcat_core::{
    administer_test, select_next_item, simulate_test, CatConfig, ItemBank, ItemParameters,
    Response, SelectionPolicy,
};

fn make_bank(n: usize) -> ItemBank {
    let items = (0..n)
        .map(|i| {
            let b = -3.0 + 6.0 * i as f64 / n as f64;
            let c = if i % 4 == 0 { 0.2 } else { 0.0 };
            ItemParameters::three_pl(format!("s{i}"), b, 0.7 + (i % 7) as f64 * 0.2, c).unwrap()
        })
        .collect();
    ItemBank::new(items).unwrap()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next_item");
    let bank = make_bank(500);
    let administered: HashSet<String> = (0..100).map(|i| format!("s{}", i * 5)).collect();

    for policy in [
        SelectionPolicy::MaxInfo,
        SelectionPolicy::DifficultyMatch,
        SelectionPolicy::Random,
    ] {
        group.bench_function(format!("{policy},bank=500"), |b| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            b.iter(|| {
                select_next_item(
                    black_box(bank.items()),
                    black_box(0.4),
                    &administered,
                    policy,
                    &mut rng,
                )
                .map(|item| item.item_id.len())
            })
        });
    }

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let bank = make_bank(200);
    let config = CatConfig {
        max_items: 30,
        se_threshold: 0.25,
        seed: Some(3),
        ..Default::default()
    };

    group.bench_function("scripted,bank=200", |b| {
        b.iter(|| {
            let mut source = ScriptedResponses::always(Response::Correct);
            administer_test(black_box(&bank), &config, &mut source)
        })
    });

    group.bench_function("simulated,bank=200", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            simulate_test(black_box(&bank), &config, 0.5, seed)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_select, bench_session);
criterion_main!(benches);
