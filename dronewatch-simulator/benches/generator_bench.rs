#[macro_use]
extern crate criterion;

use chrono::Utc;
use criterion::{black_box, Criterion};
use dronewatch_simulator::{DetectionGenerator, LocalDataset};

fn benchmark_payload_generation(c: &mut Criterion) {
    let now = Utc::now();
    let mut generator = DetectionGenerator::new(Some(42));

    c.bench_function("generate_payload", |b| {
        b.iter(|| black_box(generator.next_payload(now)))
    });
}

fn benchmark_local_create(c: &mut Criterion) {
    let now = Utc::now();
    let mut generator = DetectionGenerator::new(Some(42));

    c.bench_function("local_dataset_create_1000", |b| {
        b.iter(|| {
            let dataset = LocalDataset::seeded(now, 42);
            for _ in 0..1000 {
                let payload = generator.next_payload(now);
                let _ = black_box(dataset.create(&payload, now));
            }
        })
    });
}

criterion_group!(benches, benchmark_payload_generation, benchmark_local_create);
criterion_main!(benches);
