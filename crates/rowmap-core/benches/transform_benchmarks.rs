//! Benchmarks for the forward and reverse transforms
//!
//! A transform is expected to stay well below the cost of the storage call it
//! precedes, so these cover a typical booking and a batch of them.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rowmap_core::{ApplicationRecord, MappingEngine, PersistenceRecord};
use serde_json::{json, Value};

fn create_booking(i: u64) -> Value {
    json!({
        "id": format!("booking-{}", i),
        "bookingReference": format!("YC-2024-{:04}", i),
        "yachtName": "Aurora",
        "startDate": "2024-07-06",
        "endDate": "2024-07-13",
        "guestCount": 6,
        "totalPrice": 8400 + i,
        "currency": "EUR",
        "firstName": "John",
        "lastName": "Smith",
        "email": "john.smith@example.com",
        "crewExperienceFile": {"name": "crew.pdf", "url": "https://x/crew.pdf", "size": 1024000},
        "signedContractFile": null,
        "status": {"depositPaid": true, "contractSigned": i % 2 == 0, "checkedIn": false},
        "notes": "Late arrival",
        "isEditing": false
    })
}

fn bench_to_persistence(c: &mut Criterion) {
    let engine = MappingEngine::booking();
    let record = ApplicationRecord::from_json(create_booking(1)).unwrap();

    c.bench_function("to_persistence", |b| {
        b.iter(|| engine.to_persistence(black_box(&record)).unwrap())
    });

    c.bench_function("to_persistence_with_report", |b| {
        b.iter(|| engine.to_persistence_with_report(black_box(&record)).unwrap())
    });
}

fn bench_from_persistence(c: &mut Criterion) {
    let engine = MappingEngine::booking();
    let record = ApplicationRecord::from_json(create_booking(1)).unwrap();
    let row = engine.to_persistence(&record).unwrap();

    c.bench_function("from_persistence", |b| {
        b.iter(|| engine.from_persistence(black_box(&row)).unwrap())
    });
}

fn bench_batches(c: &mut Criterion) {
    let engine = MappingEngine::booking();
    let mut group = c.benchmark_group("batch_round_trip");

    for size in [10u64, 100, 1000] {
        let records: Vec<ApplicationRecord> = (0..size)
            .map(|i| ApplicationRecord::from_json(create_booking(i)).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                records
                    .iter()
                    .map(|r| engine.to_persistence(r).unwrap())
                    .map(|row: PersistenceRecord| engine.from_persistence(&row).unwrap())
                    .count()
            })
        });
    }

    group.finish();
}

fn bench_json_boundary(c: &mut Criterion) {
    let value = create_booking(1);

    c.bench_function("classify_application_json", |b| {
        b.iter(|| ApplicationRecord::from_json(black_box(value.clone())).unwrap())
    });
}

criterion_group!(
    benches,
    bench_to_persistence,
    bench_from_persistence,
    bench_batches,
    bench_json_boundary
);
criterion_main!(benches);
