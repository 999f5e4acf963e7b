//! Criterion micro-benchmarks for frame access, capture, query and reset.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_bench::{
    build_profile, drive_tick, initialize_profile, reference_profile, Consumer, Facility,
};
use tessera_frame::{BackendKind, Frame, SnapshotQuery};

fn warmed(kind: BackendKind) -> Frame {
    let mut frame = build_profile(kind, reference_profile()).unwrap();
    initialize_profile(&mut frame).unwrap();
    frame.seal_all();
    for tick in 0..16 {
        drive_tick(&mut frame, tick).unwrap();
        frame.take_snapshot(tick).unwrap();
    }
    frame
}

fn bench_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("access");
    for kind in BackendKind::ALL {
        let mut frame = warmed(kind);
        let consumers = frame.instance_count(Consumer::NAME).unwrap();

        group.bench_with_input(BenchmarkId::new("get_by_name", kind), &kind, |b, _| {
            b.iter(|| {
                for index in 0..consumers {
                    black_box(frame.get(Consumer::NAME, index, "demand").unwrap());
                }
            });
        });

        let demand = frame.attr_handle(Consumer::NAME, "demand").unwrap();
        group.bench_with_input(BenchmarkId::new("get_by_handle", kind), &kind, |b, _| {
            b.iter(|| {
                for index in 0..consumers {
                    black_box(frame.get_by(demand, index, 0).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("set_by_handle", kind), &kind, |b, _| {
            b.iter(|| {
                for index in 0..consumers {
                    frame.set_by(demand, index, 0, black_box(index as u16)).unwrap();
                }
            });
        });

        let pending = frame.attr_handle(Facility::NAME, "pending_orders").unwrap();
        let mut out = Vec::new();
        group.bench_with_input(BenchmarkId::new("get_list_by_handle", kind), &kind, |b, _| {
            b.iter(|| {
                out.clear();
                frame.get_list_by(pending, 0, &mut out).unwrap();
                black_box(out.len());
            });
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for kind in BackendKind::ALL {
        let mut frame = warmed(kind);
        let mut tick = 16;
        group.bench_with_input(BenchmarkId::new("drive_and_capture", kind), &kind, |b, _| {
            b.iter(|| {
                drive_tick(&mut frame, tick).unwrap();
                frame.take_snapshot(tick).unwrap();
                tick += 1;
            });
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let series = SnapshotQuery::new(Consumer::NAME).attrs(["demand", "price", "orders"]);
    let single = SnapshotQuery::new(Facility::NAME)
        .tick(15u64)
        .index(7)
        .attrs(["capacity", "stock"]);
    for kind in BackendKind::ALL {
        let frame = warmed(kind);
        group.bench_with_input(BenchmarkId::new("all_ticks_all_consumers", kind), &kind, |b, _| {
            b.iter(|| black_box(frame.query(&series).unwrap().to_f32_vec()));
        });
        group.bench_with_input(BenchmarkId::new("single_cell", kind), &kind, |b, _| {
            b.iter(|| black_box(frame.query(&single).unwrap()));
        });
    }
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("reset");
    for kind in BackendKind::ALL {
        let mut frame = warmed(kind);
        group.bench_with_input(BenchmarkId::new("reset", kind), &kind, |b, _| {
            b.iter(|| frame.reset().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_access, bench_tick, bench_query, bench_reset);
criterion_main!(benches);
