//! Benchmark suite for record stream decode throughput
//!
//! Measures chunk reassembly and record decoding over synthetic streams:
//! - reassembly alone (header parsing + record slicing)
//! - full decode of scalar-heavy records
//! - full decode of records with a variable-length trailing array

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use sliderule_stream::{
    decode_record, FieldDef, RecordDef, SchemaSet, StreamAssembler, REC_VERSION,
};

/// Encode one wire record (header + NUL-terminated type name + data)
fn wire_record(type_name: &str, data: &[u8]) -> Vec<u8> {
    let type_len = (type_name.len() + 1) as u16;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&REC_VERSION.to_be_bytes());
    bytes.extend_from_slice(&type_len.to_be_bytes());
    bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
    bytes.extend_from_slice(type_name.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(data);
    bytes
}

fn field(type_name: &str, elements: u32, bit_offset: u64) -> FieldDef {
    FieldDef {
        type_name: type_name.to_string(),
        elements,
        offset: bit_offset,
        flags: String::new(),
    }
}

/// Scalar-heavy definition: four fixed fields, 22 bytes per record.
fn scalar_schemas() -> SchemaSet {
    SchemaSet::from_defs([RecordDef::new(
        "benchrec",
        vec![
            ("cycle".to_string(), field("UINT16", 1, 0)),
            ("segment".to_string(), field("UINT32", 1, 16)),
            ("time".to_string(), field("TIME8", 1, 48)),
            ("height".to_string(), field("DOUBLE", 1, 112)),
        ],
        22,
    )])
}

fn scalar_record_data() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&7u16.to_le_bytes());
    data.extend_from_slice(&1234u32.to_le_bytes());
    data.extend_from_slice(&1_700_000_000_000_000i64.to_le_bytes());
    data.extend_from_slice(&101.25f64.to_le_bytes());
    data
}

/// Definition with a trailing f64 array filling the rest of the record.
fn trailing_schemas() -> SchemaSet {
    SchemaSet::from_defs([RecordDef::new(
        "arrayrec",
        vec![
            ("count".to_string(), field("UINT32", 1, 0)),
            ("samples".to_string(), field("DOUBLE", 0, 32)),
        ],
        0,
    )])
}

fn trailing_record_data(samples: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&(samples as u32).to_le_bytes());
    for i in 0..samples {
        data.extend_from_slice(&(i as f64 * 0.5).to_le_bytes());
    }
    data
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");

    for records in [100usize, 1000] {
        let data = scalar_record_data();
        let mut stream_bytes = Vec::new();
        for _ in 0..records {
            stream_bytes.extend(wire_record("benchrec", &data));
        }
        group.throughput(Throughput::Bytes(stream_bytes.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("contiguous", records),
            &stream_bytes,
            |b, stream_bytes| {
                b.iter(|| {
                    let mut assembler = StreamAssembler::new();
                    let out = assembler.feed(black_box(stream_bytes)).unwrap();
                    black_box(out)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("small_chunks", records),
            &stream_bytes,
            |b, stream_bytes| {
                b.iter(|| {
                    let mut assembler = StreamAssembler::new();
                    let mut total = 0usize;
                    for chunk in stream_bytes.chunks(64) {
                        total += assembler.feed(black_box(chunk)).unwrap().len();
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

fn bench_record_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decode");

    let schemas = scalar_schemas();
    let data = scalar_record_data();
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("scalar_fields", |b| {
        b.iter(|| {
            let record =
                decode_record("benchrec", &schemas, black_box(&data), 0, data.len()).unwrap();
            black_box(record)
        });
    });

    let schemas = trailing_schemas();
    for samples in [16usize, 256] {
        let data = trailing_record_data(samples);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("trailing_array", samples),
            &data,
            |b, data| {
                b.iter(|| {
                    let record =
                        decode_record("arrayrec", &schemas, black_box(data), 0, data.len())
                            .unwrap();
                    black_box(record)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reassembly, bench_record_decode);
criterion_main!(benches);
