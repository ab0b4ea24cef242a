//! Benchmarks for promise settlement and reactor round trips

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iou::prelude::*;

fn bench_settle_with_handlers(c: &mut Criterion) {
    let mut group = c.benchmark_group("settle_with_handlers");

    for handlers in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(handlers), &handlers, |b, &n| {
            b.iter(|| {
                let p: Promise<u64, ()> = Promise::new();
                let derived: Vec<_> = (0..n)
                    .map(|_| p.on_fulfilled(Handler::map(|v: u64| black_box(v + 1))))
                    .collect();
                p.fulfill(1).unwrap();
                derived
            });
        });
    }

    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    c.bench_function("chain_depth_100", |b| {
        b.iter(|| {
            let head: Promise<u64, ()> = Promise::new();
            let mut tail = head.clone();
            for _ in 0..100 {
                tail = tail.on_fulfilled(Handler::map(|v: u64| v + 1));
            }
            head.fulfill(0).unwrap();
            black_box(tail.wait())
        });
    });
}

fn bench_reactor_round_trip(c: &mut Criterion) {
    let reactor = Reactor::new(executor_fn(
        |task: &Task<u64, u64>| -> std::result::Result<u64, Failure<u64>> {
            Ok(black_box(*task.payload()) * 2)
        },
    ));
    reactor.start().unwrap();

    c.bench_function("reactor_round_trip", |b| {
        b.iter(|| reactor.submit(Task::new(21)).unwrap().wait().unwrap());
    });

    c.bench_function("reactor_batch_100", |b| {
        b.iter(|| {
            let promises: Vec<_> = (0..100)
                .map(|i| reactor.submit(Task::new(i)).unwrap())
                .collect();
            for p in promises {
                p.wait().unwrap();
            }
        });
    });

    reactor.stop_and_wait(None).unwrap();
}

criterion_group!(
    benches,
    bench_settle_with_handlers,
    bench_chain_depth,
    bench_reactor_round_trip
);
criterion_main!(benches);
