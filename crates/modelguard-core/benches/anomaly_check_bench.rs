use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use modelguard_core::{AnomalyCheck, Batch, NullCheck};
use std::hint::black_box;
use std::sync::Arc;

/// Build a batch of `n_cols` float columns with `size` rows.
///
/// Every 97th value is pushed far from the rest so the anomaly scan has
/// something to report, and every 50th is null.
fn create_batch(size: usize, n_cols: usize) -> Batch {
    let fields: Vec<Field> = (0..n_cols)
        .map(|c| Field::new(format!("col_{c}"), DataType::Float64, true))
        .collect();
    let columns: Vec<ArrayRef> = (0..n_cols)
        .map(|c| {
            let values: Float64Array = (0..size)
                .map(|i| match i {
                    i if i % 50 == 0 => None,
                    i if i % 97 == 0 => Some(10_000.0 + c as f64),
                    i => Some((i % 100) as f64 + c as f64),
                })
                .collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    Batch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

fn bench_anomaly_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("anomaly_check");
    let check = AnomalyCheck::default();
    for size in [1_000usize, 10_000, 100_000] {
        let batch = create_batch(size, 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| check.run(black_box(batch)).unwrap())
        });
    }
    group.finish();
}

fn bench_null_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("null_check");
    let check = NullCheck::default();
    for size in [10_000usize, 100_000] {
        let batch = create_batch(size, 8);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| check.run(black_box(batch)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_anomaly_check, bench_null_check);
criterion_main!(benches);
