use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use statebox::{compose, create_store, ActionSet, Definition, Store, Value};

fn counter() -> Store {
    create_store(ActionSet::new().action("inc", |state, _| {
        Value::from(state.as_f64().unwrap_or(0.0) + 1.0)
    }))
}

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| black_box(counter()));
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store = counter();
    store.dispatch("inc", &[]).unwrap();

    c.bench_function("store_read", |b| {
        b.iter(|| {
            black_box(store.get());
        });
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let store = counter();

    c.bench_function("dispatch", |b| {
        b.iter(|| {
            black_box(store.dispatch("inc", &[]).unwrap());
        });
    });
}

fn subscriber_fanout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscriber_fanout");

    for subscribers in [1, 10, 100].iter() {
        let store = counter();
        for _ in 0..*subscribers {
            store.subscribe(|state| {
                black_box(state);
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            subscribers,
            |b, _| {
                b.iter(|| {
                    store.dispatch("inc", &[]).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn compose_propagation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_propagation");

    for width in [1, 10, 50].iter() {
        let stores: Vec<Store> = (0..*width).map(|_| counter()).collect();
        let composed = compose(Definition::list(stores.iter()));
        composed.subscribe(|state| {
            black_box(state);
        });

        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                stores[0].dispatch("inc", &[]).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    store_creation_benchmark,
    store_read_benchmark,
    dispatch_benchmark,
    subscriber_fanout_benchmark,
    compose_propagation_benchmark
);
criterion_main!(benches);
