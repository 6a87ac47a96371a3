//! Allocation service throughput benchmarks

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use shortmint::cache::RedirectCache;
use shortmint::config::CacheConfig;
use shortmint::generator::{CounterGenerator, RandomGenerator};
use shortmint::services::{AllocationPolicy, AllocationService, CreateRequest};
use shortmint::storage::MemoryStore;

fn service(cache_enabled: bool, counter: bool) -> Arc<AllocationService> {
    let cache = RedirectCache::new(&CacheConfig {
        enabled: cache_enabled,
        max_capacity: 100_000,
        ttl_secs: 3600,
    });
    let generator: Arc<dyn shortmint::generator::CodeGenerator> = if counter {
        Arc::new(CounterGenerator::new(8, 0))
    } else {
        Arc::new(RandomGenerator::new(8))
    };
    Arc::new(AllocationService::new(
        Arc::new(MemoryStore::new(64)),
        generator,
        Arc::new(cache),
        AllocationPolicy::default(),
    ))
}

// ============== Create ==============

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("create");
    group.throughput(Throughput::Elements(1));

    for (name, counter) in [("random", false), ("counter", true)] {
        let svc = service(false, counter);
        let seq = Arc::new(AtomicU64::new(0));
        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| {
                let svc = Arc::clone(&svc);
                let n = seq.fetch_add(1, Ordering::Relaxed);
                async move {
                    svc.create(CreateRequest::new(format!("https://example.com/{}", n)))
                        .await
                        .unwrap()
                }
            });
        });
    }

    group.finish();
}

// ============== Resolve ==============

fn bench_resolve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("resolve");

    for (name, cache_enabled) in [("cached", true), ("store_only", false)] {
        let svc = service(cache_enabled, false);
        let codes: Vec<String> = rt.block_on(async {
            let mut codes = Vec::with_capacity(1000);
            for i in 0..1000 {
                let m = svc
                    .create(CreateRequest::new(format!("https://example.com/{}", i)))
                    .await
                    .unwrap();
                codes.push(m.short_code);
            }
            codes
        });
        let codes = Arc::new(codes);
        let seq = Arc::new(AtomicU64::new(0));

        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| {
                let svc = Arc::clone(&svc);
                let codes = Arc::clone(&codes);
                let i = seq.fetch_add(1, Ordering::Relaxed) as usize % codes.len();
                async move { svc.resolve(&codes[i]).await.unwrap() }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create, bench_resolve);
criterion_main!(benches);
