//! Query benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use indexq_bench::utils::{populated, random_people, runtime, TABLE};
use indexq_core::query::merge;
use indexq_core::{AddOptions, Query};

/// Benchmark selects of growing complexity.
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let rt = runtime();

    for rows in [100, 1_000, 10_000].iter() {
        let conn = rt.block_on(populated(*rows));
        group.throughput(Throughput::Elements(*rows as u64));

        let queries = [
            ("equality", Query::new().eq("city", "Oslo")),
            ("range", Query::new().gte("age", 18).lt("age", 65)),
            (
                "intersect",
                Query::new().eq("city", "Oslo").gte("age", 18).lt("age", 65),
            ),
            (
                "exclude",
                Query::new().gte("age", 18).ne("city", "Oslo"),
            ),
        ];
        for (name, query) in &queries {
            group.bench_with_input(BenchmarkId::new(*name, rows), query, |b, query| {
                b.iter(|| {
                    let found = rt.block_on(conn.select(TABLE, black_box(query))).unwrap();
                    black_box(found);
                });
            });
        }
    }
    group.finish();
}

/// Benchmark merging overlapping batches.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1_000, 10_000].iter() {
        let rows = random_people(*size);
        let half = rows[..size / 2].to_vec();
        let excluded = rows[..size / 10].to_vec();
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let merged = merge(
                    vec![rows.clone(), half.clone()],
                    vec![excluded.clone()],
                )
                .unwrap();
                black_box(merged);
            });
        });
    }
    group.finish();
}

/// Benchmark concurrent batch writes.
fn bench_multi_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_add");
    let rt = runtime();

    for batch in [10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), batch, |b, &batch| {
            let conn = rt.block_on(populated(0));
            let rows = random_people(batch);
            b.iter(|| {
                rt.block_on(conn.multi_add(TABLE, black_box(rows.clone()), AddOptions::upsert()))
                    .unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark query-driven deletes.
fn bench_delete(c: &mut Criterion) {
    let rt = runtime();
    c.bench_function("delete_range_1000", |b| {
        b.iter_batched(
            || rt.block_on(populated(1_000)),
            |conn| {
                let deleted = rt
                    .block_on(conn.delete(TABLE, &Query::new().lt("age", 18)))
                    .unwrap();
                black_box(deleted);
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_select, bench_merge, bench_multi_add, bench_delete);
criterion_main!(benches);
