use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use colstore_eval::{Column, Interval, IntervalFlags};

fn bench_attribute_maps(c: &mut Criterion) {
    let mut group = c.benchmark_group("IntervalFlags");

    let sizes = [1000, 10_000, 100_000];

    for n in sizes.iter() {
        // every other row flagged: the worst case for run storage
        group.bench_with_input(BenchmarkId::new("Set/Alternating", n), n, |b, &n| {
            b.iter(|| {
                let mut flags = IntervalFlags::new();
                for row in (0..n).step_by(2) {
                    flags.set(Interval::row(row), black_box(true));
                }
                flags
            });
        });

        let mut flags = IntervalFlags::new();
        for row in (0..*n).step_by(2) {
            flags.set(Interval::row(row), true);
        }

        group.bench_with_input(BenchmarkId::new("Query/Point", n), n, |b, &n| {
            b.iter(|| flags.is_set(black_box(n / 2)))
        });

        group.bench_with_input(BenchmarkId::new("InsertRows/Middle", n), n, |b, &n| {
            b.iter_batched(
                || flags.clone(),
                |mut f| f.insert_rows(black_box(n / 2), 10),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("RemoveRows/Front", n), n, |b, _| {
            b.iter_batched(
                || flags.clone(),
                |mut f| f.remove_rows(black_box(0), 10),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_column_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Column");
    for n in [1000usize, 100_000].iter() {
        let col = Column::from_doubles("x", (0..*n).map(|v| v as f64).collect());
        col.properties();
        group.bench_with_input(BenchmarkId::new("IndexForValue/Monotonic", n), n, |b, &n| {
            b.iter(|| col.index_for_value(black_box(n as f64 / 3.0), true))
        });
        group.bench_with_input(BenchmarkId::new("Statistics", n), n, |b, &n| {
            b.iter_batched(
                || Column::from_doubles("y", (0..n).map(|v| (v % 97) as f64).collect()),
                |c| c.statistics(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_attribute_maps, bench_column_lookup);
criterion_main!(benches);
