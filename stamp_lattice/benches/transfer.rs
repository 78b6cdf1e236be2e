//! Transfer function and lattice operation benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stamp_lattice::config::LatticeConfig;
use stamp_lattice::constant::Constant;
use stamp_lattice::factory::{StampCache, StampFactory};
use stamp_lattice::stamp::{IntegerStamp, Stamp};
use stamp_lattice::tfuncs::{self, register_all, OpCode, TFuncContext, TransferFunctions};
use std::hint::black_box;
use std::sync::Arc;

fn ranges() -> Vec<Stamp> {
    vec![
        IntegerStamp::for_range(32, 0, 10),
        IntegerStamp::for_range(32, -1000, 1000),
        IntegerStamp::for_range(32, 1 << 20, 1 << 24),
        IntegerStamp::create(32, 0, 255, 0b1, 0xff),
    ]
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("arithmetic");
    let stamps = ranges();

    group.bench_function("add", |b| {
        b.iter(|| {
            for x in &stamps {
                for y in &stamps {
                    black_box(tfuncs::add(black_box(x), black_box(y)));
                }
            }
        })
    });
    group.bench_function("mul", |b| {
        b.iter(|| {
            for x in &stamps {
                for y in &stamps {
                    black_box(tfuncs::mul(black_box(x), black_box(y)));
                }
            }
        })
    });
    group.finish();
}

fn bench_shifts(c: &mut Criterion) {
    let mut group = c.benchmark_group("shifts");
    let value = IntegerStamp::for_range(32, -1000, 1000);

    for width in [1, 8, 32] {
        let amount = IntegerStamp::for_range(32, 0, width - 1);
        group.bench_with_input(BenchmarkId::new("shl", width), &amount, |b, amount| {
            b.iter(|| black_box(tfuncs::left_shift(black_box(&value), amount)))
        });
        group.bench_with_input(BenchmarkId::new("ushr", width), &amount, |b, amount| {
            b.iter(|| black_box(tfuncs::unsigned_right_shift(black_box(&value), amount)))
        });
    }
    group.finish();
}

fn bench_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("lattice");
    let stamps = ranges();

    group.bench_function("meet", |b| {
        b.iter(|| {
            for x in &stamps {
                for y in &stamps {
                    black_box(x.meet(black_box(y)));
                }
            }
        })
    });
    group.bench_function("join", |b| {
        b.iter(|| {
            for x in &stamps {
                for y in &stamps {
                    black_box(x.join(black_box(y)));
                }
            }
        })
    });
    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut registry = TransferFunctions::new();
    register_all(&mut registry);
    let ctx = TFuncContext::new();
    let args = [
        IntegerStamp::for_range(32, 0, 100),
        IntegerStamp::for_range(32, 3, 3),
    ];

    c.bench_function("registry_infer_add", |b| {
        b.iter(|| black_box(registry.infer(OpCode::Add, black_box(&args), &ctx)))
    });
}

fn bench_factory(c: &mut Criterion) {
    let mut group = c.benchmark_group("factory");
    let factory = StampFactory::new(Arc::new(StampCache::new()), LatticeConfig::default());

    group.bench_function("for_constant_cached", |b| {
        let five = Constant::int(5);
        factory.for_constant(&five);
        b.iter(|| black_box(factory.for_constant(black_box(&five))))
    });
    group.bench_function("for_constant_uncached", |b| {
        let five = Constant::int(5);
        b.iter(|| black_box(Stamp::for_constant(black_box(&five))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_arithmetic,
    bench_shifts,
    bench_lattice,
    bench_registry,
    bench_factory
);
criterion_main!(benches);
