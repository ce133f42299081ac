//! Lookup latency benchmarks.
//!
//! Measures warm path lookups against an on-disk archive, with and without
//! the page cache.
//!
//! Run with:
//! ```bash
//! cargo bench --bench lookup
//! ```

#![allow(clippy::expect_used)]

use bigpack_format::Fingerprint;
use bigpack_storage::testing::ArchiveBuilder;
use bigpack_storage::{ArchiveConfig, ArchiveIndex};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::TempDir;

const FILES: usize = 20_000;

/// Write an archive of `FILES` small documents.
fn create_archive() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temporary benchmark directory");
    let mut builder = ArchiveBuilder::new();
    for i in 0..FILES {
        builder.add(
            &format!("site/{i}/index.html"),
            format!("<html><body>page {i}</body></html>").as_bytes(),
        );
    }
    builder
        .write_to(dir.path())
        .expect("Failed to write benchmark archive");
    dir
}

fn bench_lookup(c: &mut Criterion) {
    let dir = create_archive();
    let mut group = c.benchmark_group("lookup");

    for cache_pages in [0, 64] {
        let config = ArchiveConfig::new(dir.path()).with_page_cache(cache_pages);
        let archive = ArchiveIndex::open(config).expect("Failed to open benchmark archive");
        let mut i = 0;

        group.bench_function(BenchmarkId::new("hit", cache_pages), |b| {
            b.iter(|| {
                i = (i + 7919) % FILES;
                black_box(
                    archive
                        .lookup(black_box(&format!("/site/{i}/")))
                        .expect("lookup failed"),
                )
            });
        });

        group.bench_function(BenchmarkId::new("miss", cache_pages), |b| {
            b.iter(|| {
                black_box(
                    archive
                        .lookup(black_box("/not/in/archive.html"))
                        .expect("lookup failed"),
                )
            });
        });
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    c.bench_function("fingerprint", |b| {
        b.iter(|| Fingerprint::from_path(black_box("site/12345/index.html")));
    });
}

criterion_group!(benches, bench_lookup, bench_fingerprint);
criterion_main!(benches);
