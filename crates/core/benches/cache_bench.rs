//! LRU store benchmarks
//!
//! Benchmarks for store writes, reads, compression and eviction under
//! capacity pressure.
//!
//! Run with: `cargo bench --bench cache_bench -p cadence-core`

use std::time::Duration;

use cadence_core::cache::{CacheConfig, LruStore};
use cadence_core::config::StoreConfig;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

fn post(i: u64) -> Value {
    json!({
        "id": i,
        "caption": format!("Scheduled post number {i}"),
        "platforms": ["instagram", "facebook"],
        "scheduled_at": 1_700_000_000 + i,
    })
}

// ============================================================================
// Basic Operations Benchmarks
// ============================================================================

fn bench_store_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_set");
    let config = CacheConfig::new(Duration::from_secs(300));

    for entries in [100u64, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("no_eviction", entries), &entries, |b, &entries| {
            let store = LruStore::new(&StoreConfig::default());
            let mut counter = 0u64;
            b.iter(|| {
                let key = format!("post:{}", counter % entries);
                store.set(black_box(&key), post(counter), &config).unwrap();
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_store_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_get_hit");
    let config = CacheConfig::new(Duration::from_secs(300));

    for entries in [100u64, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("lru", entries), &entries, |b, &entries| {
            let store = LruStore::new(&StoreConfig::default());
            for i in 0..entries {
                store.set(&format!("post:{i}"), post(i), &config).unwrap();
            }
            let mut counter = 0u64;
            b.iter(|| {
                let key = format!("post:{}", counter % entries);
                let _ = black_box(store.get(black_box(&key)));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

// ============================================================================
// Eviction & Compression Benchmarks
// ============================================================================

fn bench_store_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_eviction");
    let config = CacheConfig::new(Duration::from_secs(300));

    for budget in [4 * 1024usize, 64 * 1024] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("budget_bytes", budget), &budget, |b, &budget| {
            let store = LruStore::new(&StoreConfig::with_max_size(budget));
            let mut counter = 0u64;
            b.iter(|| {
                store.set(&format!("post:{counter}"), post(counter), &config).unwrap();
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_store_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_compression");
    let body: Vec<Value> = (0..200).map(post).collect();
    let plain = CacheConfig::new(Duration::from_secs(300));
    let compressed = CacheConfig::builder(Duration::from_secs(300)).compress(true).build();

    for (name, config) in [("plain", &plain), ("gzip", &compressed)] {
        group.bench_function(BenchmarkId::new("set_get", name), |b| {
            let store = LruStore::new(&StoreConfig::default());
            b.iter(|| {
                store.set("feed", json!(body), config).unwrap();
                black_box(store.get("feed"));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_store_set,
    bench_store_get_hit,
    bench_store_eviction,
    bench_store_compression
);
criterion_main!(benches);
