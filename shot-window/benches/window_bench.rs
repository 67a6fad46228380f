use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use futures::stream::FuturesUnordered;
use futures::stream::StreamExt;

use shot_window::FixedWindowLimiter;
use shot_window::MemoryStore;
use shot_window::RateLimitSpec;

fn spec(action_id: &str) -> RateLimitSpec {
    RateLimitSpec::new(
        action_id,
        NonZeroU64::new(1_000_000).unwrap(),
        Duration::from_secs(60),
    )
    .unwrap()
}

fn bench_memory_store(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(8)
        .enable_all()
        .build()
        .unwrap();

    let limiter = Arc::new(FixedWindowLimiter::new(MemoryStore::new()));
    let hot = Arc::new(spec("hot"));

    let mut group = c.benchmark_group("MemoryStore");

    group.bench_function("increment", |b| {
        b.to_async(&rt).iter(|| {
            let limiter = Arc::clone(&limiter);
            let hot = Arc::clone(&hot);
            async move { black_box(limiter.increment(&hot).await) }
        })
    });

    group.bench_function("status", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(limiter.status("hot").await) })
    });

    // Many tasks contending for the same key
    group.bench_function("increment-burst-1000", |b| {
        b.to_async(&rt).iter(|| {
            let limiter = Arc::clone(&limiter);
            let hot = Arc::clone(&hot);
            async move {
                let mut futures = FuturesUnordered::new();
                for _ in 0..1000 {
                    let limiter = Arc::clone(&limiter);
                    let hot = Arc::clone(&hot);
                    futures.push(tokio::spawn(async move { limiter.increment(&hot).await }));
                }
                while let Some(res) = futures.next().await {
                    let _ = black_box(res);
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_memory_store);
criterion_main!(benches);
