use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use lob_matching::{MatchingEngine, Order, SequenceGenerator, Side};

fn setup_engine() -> (MatchingEngine, SequenceGenerator) {
    (MatchingEngine::new(Uuid::new_v4()), SequenceGenerator::new())
}

fn fill_asks(engine: &mut MatchingEngine, sequence: &SequenceGenerator, levels: i64, per_level: usize, size: u64) {
    for i in 0..levels {
        for _ in 0..per_level {
            let order = Order::with_sequence(Side::Ask, size, sequence.next());
            engine.place_limit_order(10_000 + i, order).unwrap();
        }
    }
}

fn bench_mixed_workload(c: &mut Criterion) {
    let (mut engine, sequence) = setup_engine();
    let mut rng = StdRng::seed_from_u64(7);
    let mut resting = Vec::new();
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("place_cancel_market", |b| {
        b.iter(|| {
            // 60% new limit orders around the mid
            for _ in 0..6 {
                let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
                let price = match side {
                    Side::Bid => rng.gen_range(9_900..10_000),
                    Side::Ask => rng.gen_range(10_001..10_100),
                };
                let order = Order::with_sequence(side, rng.gen_range(1..10), sequence.next());
                let placement = engine.place_limit_order(price, order).unwrap();
                resting.push(placement.order_id);
            }

            // 20% cancellations, some of which hit already filled orders
            for _ in 0..2 {
                if resting.is_empty() {
                    break;
                }
                let idx = rng.gen_range(0..resting.len());
                let order_id = resting.swap_remove(idx);
                let _ = black_box(engine.cancel_order(order_id));
            }

            // 20% market orders
            for _ in 0..2 {
                let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
                let mut order = Order::with_sequence(side, rng.gen_range(1..5), sequence.next());
                let _ = black_box(engine.place_market_order(&mut order));
            }
        })
    });

    group.finish();
}

fn bench_resting_insert(c: &mut Criterion) {
    let (mut engine, sequence) = setup_engine();
    let mut group = c.benchmark_group("resting_insert");

    group.bench_function("same_level", |b| {
        b.iter(|| {
            let order = Order::with_sequence(Side::Bid, 1, sequence.next());
            black_box(engine.place_limit_order(9_999, order).unwrap());
        })
    });

    group.finish();
}

fn bench_market_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_sweep");

    group.bench_function("sweep_ten_levels", |b| {
        b.iter_batched(
            || {
                let (mut engine, sequence) = setup_engine();
                fill_asks(&mut engine, &sequence, 10, 10, 1);
                (engine, sequence)
            },
            |(mut engine, sequence)| {
                let mut order = Order::with_sequence(Side::Bid, 100, sequence.next());
                black_box(engine.place_market_order(&mut order).unwrap())
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("single_fill", |b| {
        b.iter_batched(
            || {
                let (mut engine, sequence) = setup_engine();
                fill_asks(&mut engine, &sequence, 5, 1, 10);
                (engine, sequence)
            },
            |(mut engine, sequence)| {
                let mut order = Order::with_sequence(Side::Bid, 1, sequence.next());
                black_box(engine.place_market_order(&mut order).unwrap())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_cancel_deep_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel_deep_level");

    group.bench_function("cancel_middle_of_1000", |b| {
        b.iter_batched(
            || {
                let (mut engine, sequence) = setup_engine();
                let ids: Vec<_> = (0..1_000)
                    .map(|_| {
                        let order = Order::with_sequence(Side::Ask, 1, sequence.next());
                        engine.place_limit_order(10_000, order).unwrap().order_id
                    })
                    .collect();
                (engine, ids[500])
            },
            |(mut engine, order_id)| black_box(engine.cancel_order(order_id).unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_depth_snapshot(c: &mut Criterion) {
    let (mut engine, sequence) = setup_engine();
    fill_asks(&mut engine, &sequence, 50, 20, 1);
    let mut group = c.benchmark_group("depth_snapshot");

    group.bench_function("top_ten_of_fifty", |b| b.iter(|| black_box(engine.depth(10))));

    group.finish();
}

criterion_group!(
    benches,
    bench_mixed_workload,
    bench_resting_insert,
    bench_market_sweep,
    bench_cancel_deep_level,
    bench_depth_snapshot,
);
criterion_main!(benches);
