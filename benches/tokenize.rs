use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use simdcsv::{Backend, PositionIndex, Table};

fn generate_csv(rows: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..rows {
        data.extend_from_slice(
            format!("{},name{},\"city {}\",{}.{}\n", i, i, i % 97, i * 3, i % 10).as_bytes(),
        );
    }
    data
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    for size_mb in [1, 10] {
        let data = generate_csv(size_mb * 1024 * 1024 / 32);
        group.throughput(Throughput::Bytes(data.len() as u64));
        for backend in Backend::available_backends() {
            group.bench_with_input(
                BenchmarkId::new(backend.name(), format!("{}MB", size_mb)),
                &data,
                |b, data| b.iter(|| PositionIndex::build_with(black_box(data), backend)),
            );
        }
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let data = generate_csv(100_000);
    let table = Table::parse(&data).unwrap();
    c.bench_function("traverse_fields", |b| {
        b.iter(|| {
            let mut bytes = 0;
            for row in &table {
                for field in &row {
                    bytes += field.len();
                }
            }
            black_box(bytes)
        })
    });
}

criterion_group!(benches, bench_build_index, bench_traverse);
criterion_main!(benches);
