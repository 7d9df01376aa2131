//! Benchmarks for sampling a bundle and serializing the resulting record
//!
//! Tests throughput for:
//! - Sampling every built-in bundle from a decoded telemetry row
//! - Record serialization for the largest bundle
//!
//! Platform: Cross-platform (synthetic telemetry row, CI-safe)

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pitwall_relay::{
    FieldSetRegistry, Record, TelemetrySource, Value, VariableInfo, VariableSchema, VariableType,
    sample,
};
use std::collections::HashMap;
use std::hint::black_box;

/// Source decoding every known field from one fixed row.
struct RowSource {
    schema: VariableSchema,
    row: Vec<u8>,
}

impl RowSource {
    /// Lay every field of every built-in bundle out as a float.
    fn for_registry(registry: &FieldSetRegistry) -> Self {
        let mut variables = HashMap::new();
        for field in registry.iter().flat_map(|set| set.fields()) {
            let offset = variables.len() * 4;
            variables
                .entry(field.clone())
                .or_insert_with(|| VariableInfo::scalar(field.as_str(), VariableType::Float32, offset));
        }

        let row: Vec<u8> =
            (0..variables.len()).flat_map(|i| (i as f32 * 0.5).to_le_bytes()).collect();
        let schema = VariableSchema::new(variables, row.len()).expect("valid schema");
        Self { schema, row }
    }
}

impl TelemetrySource for RowSource {
    fn is_initialized(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn startup(&mut self) -> bool {
        true
    }

    fn shutdown(&mut self) {}

    fn read(&self, field: &str) -> Option<Value> {
        let info = self.schema.get_variable(field)?;
        Value::decode(&self.row, info).ok()
    }
}

fn bench_sampling(c: &mut Criterion) {
    let registry = FieldSetRegistry::builtin().expect("built-in bundles");
    let source = RowSource::for_registry(&registry);

    let mut group = c.benchmark_group("sampling");
    for set in registry.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(set.name()), set, |b, set| {
            b.iter(|| black_box(sample(set, &source)))
        });
    }
    group.finish();
}

fn bench_record_json(c: &mut Criterion) {
    let registry = FieldSetRegistry::builtin().expect("built-in bundles");
    let source = RowSource::for_registry(&registry);
    let vehicle = registry.get("Vehicle").expect("Vehicle bundle");
    let ts_send = Utc::now();

    let mut group = c.benchmark_group("record_json");
    group.bench_function("vehicle_to_json", |b| {
        b.iter_batched(
            || sample(vehicle, &source),
            |sample| {
                let record = Record::at(sample, "Vehicle", ts_send);
                black_box(record.to_json().expect("serializable"))
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("vehicle_sample_and_json", |b| {
        b.iter(|| {
            let record = Record::new(sample(vehicle, &source), "Vehicle");
            black_box(record.to_json().expect("serializable"))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_sampling, bench_record_json);
criterion_main!(benches);
