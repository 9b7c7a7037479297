//! Propagation benchmarks: trigger fan-out and computed chains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reactivity_core::reactive::{computed, effect, reactive, ref_, Computed};
use reactivity_core::Object;

fn trigger_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigger_fan_out");

    for subscribers in [1usize, 16, 256] {
        let state = reactive(Object::from_iter([("count", 0)]));
        let runs = Arc::new(AtomicUsize::new(0));

        let runners: Vec<_> = (0..subscribers)
            .map(|_| {
                let state = state.clone();
                let runs = runs.clone();
                effect(move || {
                    black_box(state.get("count"));
                    runs.fetch_add(1, Ordering::Relaxed);
                })
            })
            .collect();

        let mut next = 0u32;
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    next += 1;
                    state.set("count", next).ok();
                })
            },
        );
        drop(runners);
    }

    group.finish();
}

fn computed_chain(c: &mut Criterion) {
    let source = ref_(0);
    let source_clone = source.clone();
    let mut tail: Computed<f64> =
        computed(move || source_clone.get().as_f64().unwrap_or_default());
    for _ in 0..32 {
        let prev = tail.clone();
        tail = computed(move || prev.get() + 1.0);
    }

    let mut next = 0u32;
    c.bench_function("computed_chain_32", |b| {
        b.iter(|| {
            next += 1;
            source.set(next);
            black_box(tail.get())
        })
    });
}

criterion_group!(benches, trigger_fan_out, computed_chain);
criterion_main!(benches);
