use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::measurement::WallTime;
use futures::stream::FuturesUnordered;
use futures::stream::StreamExt;
use http::Request;
use http::Response;
use shot_window::FixedWindowLimiter;
use shot_window::MemoryStore;
use shot_window::RateLimitSpec;
use std::hint::black_box;
use tower::BoxError;
use tower::Service;
use tower::ServiceBuilder;
use tower::ServiceExt;
use tower::service_fn;
use tower::util::BoxCloneSyncService;
use tower_shot_window::WindowLimitLayer;

// --- HELPERS & TYPES ---

type BenchService = BoxCloneSyncService<Request<String>, Response<String>, BoxError>;

async fn noop_handler(_req: Request<String>) -> Result<Response<String>, BoxError> {
    Ok(Response::new("ok".to_string()))
}

/// Generic runner for single-call overhead benchmarks
fn bench_overhead(
    group: &mut BenchmarkGroup<WallTime>,
    rt: &tokio::runtime::Runtime,
    id: &str,
    svc: BenchService,
) {
    group.bench_function(id, |b| {
        b.to_async(rt).iter(|| {
            let mut s = svc.clone();
            async move {
                let req = Request::builder().body("test".to_string()).unwrap();
                let res = s.ready().await.unwrap().call(req).await;
                black_box(res)
            }
        });
    });
}

/// Generic runner for burst/contention benchmarks
fn bench_burst(
    group: &mut BenchmarkGroup<WallTime>,
    rt: &tokio::runtime::Runtime,
    id: &str,
    svc: BenchService,
    burst_size: usize,
) {
    group.bench_function(id, |b| {
        b.to_async(rt).iter(|| {
            let s = svc.clone();
            async move {
                let mut futures = FuturesUnordered::new();
                for _ in 0..burst_size {
                    let mut local_svc = s.clone();
                    futures.push(async move {
                        let req = Request::builder().body("test".to_string()).unwrap();
                        local_svc.ready().await.unwrap().call(req).await
                    });
                }
                while let Some(res) = futures.next().await {
                    let _ = black_box(res);
                }
            }
        });
    });
}

// --- MAIN BENCHMARK ---

fn bench_all_scenarios(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(8)
        .enable_all()
        .build()
        .unwrap();

    let burst_size = 1000;

    // A huge limit so we measure the overhead of the check, not rejections
    let policy = RateLimitSpec::new(
        "bench-",
        NonZeroU64::new(u64::MAX).unwrap(),
        Duration::from_secs(60),
    )
    .unwrap();
    let limiter = Arc::new(FixedWindowLimiter::new(MemoryStore::new()));

    let scenarios: Vec<(&str, BenchService)> = vec![
        (
            "no_limit",
            BoxCloneSyncService::new(ServiceBuilder::new().service(service_fn(noop_handler))),
        ),
        (
            "window_single_key",
            BoxCloneSyncService::new(
                ServiceBuilder::new()
                    .layer(WindowLimitLayer::new(
                        limiter.clone(),
                        policy.clone(),
                        |_req: &Request<String>| "all".to_string(),
                    ))
                    .service(service_fn(noop_handler)),
            ),
        ),
        (
            "window_by_path",
            BoxCloneSyncService::new(
                ServiceBuilder::new()
                    .layer(WindowLimitLayer::new(
                        limiter.clone(),
                        policy.clone(),
                        |req: &Request<String>| req.uri().path().to_string(),
                    ))
                    .service(service_fn(noop_handler)),
            ),
        ),
    ];

    let mut group = c.benchmark_group("Overhead");
    for (id, svc) in &scenarios {
        bench_overhead(&mut group, &rt, id, svc.clone());
    }
    group.finish();

    let mut group = c.benchmark_group("Burst");
    for (id, svc) in scenarios {
        bench_burst(&mut group, &rt, id, svc, burst_size);
    }
    group.finish();
}

criterion_group!(benches, bench_all_scenarios);
criterion_main!(benches);
