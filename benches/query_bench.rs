// benches/query_bench.rs

use bai_index::{query, BaiReader, Chunk, IndexBuilder, IndexableRecord, VirtualOffset};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs::File;

struct SyntheticRecord {
    reference_index: i32,
    start: i32,
    end: i32,
    span: Chunk,
}

impl IndexableRecord for SyntheticRecord {
    fn reference_index(&self) -> i32 {
        self.reference_index
    }
    fn alignment_start(&self) -> i32 {
        self.start
    }
    fn alignment_end(&self) -> i32 {
        self.end
    }
    fn is_unmapped(&self) -> bool {
        false
    }
    fn indexing_bin(&self) -> Option<u32> {
        None
    }
    fn file_span(&self) -> Option<Chunk> {
        Some(self.span)
    }
}

fn build_synthetic_index(path: &std::path::Path, n_records: usize) {
    let mut builder = IndexBuilder::new(1);
    let mut pos = 1i32;
    let mut block = 0u64;
    for _ in 0..n_records {
        let len = 150;
        let chunk = Chunk::new(
            VirtualOffset::new(block, 0),
            VirtualOffset::new(block + 1, 0),
        );
        builder
            .add_record(&SyntheticRecord {
                reference_index: 0,
                start: pos,
                end: pos + len,
                span: chunk,
            })
            .unwrap();
        pos += 50;
        block += 1;
    }
    let (refs, no_coord) = builder.finish();
    let mut file = File::create(path).unwrap();
    bai_index::write_index(&mut file, &refs, Some(no_coord)).unwrap();
}

fn query_benchmark(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.bai");
    build_synthetic_index(&path, 200_000);
    let reader = BaiReader::open(&path).unwrap();

    let regions = vec![
        ("narrow", 1_000i64, 2_000i64),
        ("mid", 10_000, 20_000),
        ("wide", 100_000, 2_000_000),
    ];

    let mut group = c.benchmark_group("genomic_query");
    for (label, start, end) in regions {
        group.bench_with_input(BenchmarkId::new("query", label), &(start, end), |b, &(s, e)| {
            b.iter(|| query(&reader, 0, s, e).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, query_benchmark);
criterion_main!(benches);
